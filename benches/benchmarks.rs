use ludozero::board::Roll;
use ludozero::game::Encoding;
use ludozero::game::GameConfig;
use ludozero::game::LudoModel;
use ludozero::game::State;
use ludozero::mcts::Constant;
use ludozero::mcts::EvaluationQueue;
use ludozero::mcts::Search;
use ludozero::mcts::Tree;
use ludozero::mcts::evaluator;
use std::sync::Arc;

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        enumerating_opening_moves,
        applying_a_whole_move,
        encoding_a_state,
        searching_an_opening,
}

fn enumerating_opening_moves(c: &mut criterion::Criterion) {
    let model = LudoModel::from(GameConfig::two_player());
    let state = State::new(model.config());
    c.bench_function("enumerate all moves from the opening", |b| {
        b.iter(|| model.all_possible_moves(&state).unwrap())
    });
}

fn applying_a_whole_move(c: &mut criterion::Criterion) {
    let model = LudoModel::from(GameConfig::two_player());
    let mut state = State::new(model.config());
    state.dice_roll = Roll::from([6, 3].as_slice());
    let mv = model
        .moves_for(&state, state.dice_roll)
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    c.bench_function("apply a six-then-three move", |b| {
        b.iter(|| model.generate_next_state(&state, &mv).unwrap())
    });
}

fn encoding_a_state(c: &mut criterion::Criterion) {
    let config = GameConfig::two_player();
    let state = State::new(&config);
    c.bench_function("encode a state", |b| {
        b.iter(|| Encoding::from((&state, &config)))
    });
}

fn searching_an_opening(c: &mut criterion::Criterion) {
    let model = LudoModel::from(GameConfig::two_player());
    let state = State::new(model.config());
    let queue = Arc::new(EvaluationQueue::new(ludozero::EQ_LENGTH));
    let handle = evaluator::spawn(queue.clone(), model.config().clone(), Arc::new(Constant(0.)));
    let search = Search {
        simulations: 256,
        ..Search::default()
    };
    c.bench_function("256 simulations over a fresh tree", |b| {
        b.iter(|| {
            let mut tree = Tree::new(&state, 0);
            tree.expand_root(&model).unwrap();
            tree.prune_root(Roll::from([6].as_slice()));
            search.rollout(&tree, &model, &queue)
        })
    });
    queue.set_stop();
    handle.join().unwrap();
}
