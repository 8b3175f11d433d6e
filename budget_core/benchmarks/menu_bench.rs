use std::sync::Arc;

use budget_core::{
    AttackGate, KillLedger, MemoryStore, MenuFilterPipeline, MonsterCatalog, MonsterRegistry,
    RegistrySettings, Scene,
};
use budget_schema::{MenuActionKind, MenuEntry, NpcView};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const NAMES: [&str; 4] = ["Goblin", "Man", "Guard", "Imp"];

fn fixture(npcs: u32) -> (MenuFilterPipeline, Scene, Vec<MenuEntry>) {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(MonsterRegistry::load(
        MonsterCatalog::builtin(),
        store.clone(),
        RegistrySettings::default(),
    ));
    let ledger = Arc::new(KillLedger::load(store));
    ledger.set_exact("Goblin", 5_000);
    ledger.set_exact("Man", 5_000);

    let mut scene = Scene::logged_in(1);
    let mut menu = vec![MenuEntry::new("Walk here", "", 0, MenuActionKind::WalkHere)];
    for id in 0..npcs {
        let name = NAMES[id as usize % NAMES.len()];
        scene.spawn(NpcView::new(id, name));
        menu.push(MenuEntry::new("Examine", name, id, MenuActionKind::ExamineNpc));
        menu.push(MenuEntry::new("Attack", name, id, MenuActionKind::NpcSecondOption));
    }
    let pipeline = MenuFilterPipeline::new(AttackGate::new(registry, ledger), true);
    (pipeline, scene, menu)
}

fn bench_client_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("client_tick");

    for npcs in [4u32, 16, 64, 256] {
        let (pipeline, scene, menu) = fixture(npcs);
        group.bench_with_input(BenchmarkId::new("npcs", npcs), &npcs, |b, _| {
            b.iter(|| pipeline.on_client_tick(&scene, &menu))
        });
    }

    group.finish();
}

criterion_group!(menu_benches, bench_client_tick);
criterion_main!(menu_benches);
