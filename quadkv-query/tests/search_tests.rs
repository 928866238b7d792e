//! End-to-end search pipeline tests over the in-memory backend.

use quadkv_core::codec::encode_term;
use quadkv_core::vocab::xsd;
use quadkv_core::{Quad, Term};
use quadkv_memory::MemoryBackend;
use quadkv_query::{
    Binding, FilterOp, QuadPattern, SearchEngine, SearchOptions, SearchResults, SearchStage,
};
use quadkv_store::{QuadStore, StoreOptions};

fn nn(suffix: &str) -> Term {
    Term::named_node(format!("http://example.org/{suffix}")).unwrap()
}

fn var(name: &str) -> Term {
    Term::variable(name).unwrap()
}

fn num(lex: &str) -> Term {
    Term::typed_literal(lex, xsd::INTEGER).unwrap()
}

fn bgp(s: Term, p: Term, o: Term) -> SearchStage {
    SearchStage::Bgp {
        pattern: QuadPattern::new(s, p, o),
    }
}

fn filter(op: FilterOp, args: Vec<Term>) -> SearchStage {
    SearchStage::Filter { op, args }
}

async fn store_with(quads: &[Quad]) -> QuadStore<MemoryBackend> {
    let store = QuadStore::open(MemoryBackend::new(), StoreOptions::default())
        .await
        .unwrap();
    store.multi_put(quads).await.unwrap();
    store
}

fn people(count: usize) -> Vec<Quad> {
    let mut quads = Vec::new();
    for i in 0..count {
        let person = nn(&format!("person{i}"));
        quads.push(Quad::triple(person.clone(), nn("age"), num(&i.to_string())).unwrap());
        quads.push(
            Quad::triple(
                person.clone(),
                nn("name"),
                Term::literal(format!("name{i}")).unwrap(),
            )
            .unwrap(),
        );
        if i % 2 == 0 {
            quads.push(Quad::triple(person, nn("team"), nn("evens")).unwrap());
        }
    }
    quads
}

fn bindings_of(results: SearchResults) -> Vec<Binding> {
    match results {
        SearchResults::Bindings { bindings, .. } => bindings,
        SearchResults::Quads(_) => panic!("expected bindings"),
    }
}

#[tokio::test]
async fn test_two_stage_join() {
    let quads = [
        Quad::triple(nn("s"), nn("p"), nn("o")).unwrap(),
        Quad::triple(nn("s"), nn("p2"), nn("o2")).unwrap(),
    ];
    let store = store_with(&quads).await;
    let engine = SearchEngine::new(&store);

    let stages = [
        bgp(var("?s"), nn("p"), nn("o")),
        bgp(var("?s"), nn("p2"), var("?o")),
    ];
    let bindings = bindings_of(
        engine
            .search(&stages, &SearchOptions::default())
            .await
            .unwrap(),
    );
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].get("?s"), Some(&nn("s")));
    assert_eq!(bindings[0].get("?o"), Some(&nn("o2")));
}

#[tokio::test]
async fn test_eq_filter() {
    let quads = [
        Quad::triple(nn("s1"), nn("p"), nn("o")).unwrap(),
        Quad::triple(nn("s2"), nn("p"), nn("o")).unwrap(),
    ];
    let store = store_with(&quads).await;
    let engine = SearchEngine::new(&store);

    let stages = [
        bgp(var("?s"), nn("p"), nn("o")),
        filter(FilterOp::Eq, vec![var("?s"), nn("s2")]),
    ];
    let bindings = bindings_of(
        engine
            .search(&stages, &SearchOptions::default())
            .await
            .unwrap(),
    );
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].get("?s"), Some(&nn("s2")));
}

#[tokio::test]
async fn test_partial_bgp_binds_only_named_positions() {
    // A pattern constraining nothing but the subject: the other positions
    // are wildcards that match anything and bind no variable.
    let quads = [
        Quad::triple(nn("s1"), nn("p"), nn("o")).unwrap(),
        Quad::triple(nn("s2"), nn("p"), nn("o")).unwrap(),
        Quad::triple(nn("s2"), nn("q"), Term::literal("x").unwrap()).unwrap(),
    ];
    let store = store_with(&quads).await;
    let engine = SearchEngine::new(&store);

    let stages = [
        SearchStage::Bgp {
            pattern: QuadPattern::any().with_subject(var("?s")),
        },
        filter(FilterOp::Eq, vec![var("?s"), nn("s2")]),
    ];
    let bindings = bindings_of(
        engine
            .search(&stages, &SearchOptions::default())
            .await
            .unwrap(),
    );
    assert_eq!(bindings.len(), 2);
    assert!(bindings
        .iter()
        .all(|b| b.len() == 1 && b.get("?s") == Some(&nn("s2"))));
}

#[tokio::test]
async fn test_two_variable_filter() {
    let quads = [
        Quad::triple(nn("a"), nn("low"), num("1")).unwrap(),
        Quad::triple(nn("a"), nn("high"), num("5")).unwrap(),
        Quad::triple(nn("b"), nn("low"), num("7")).unwrap(),
        Quad::triple(nn("b"), nn("high"), num("3")).unwrap(),
    ];
    let store = store_with(&quads).await;
    let engine = SearchEngine::new(&store);

    let stages = [
        bgp(var("?s"), nn("low"), var("?lo")),
        bgp(var("?s"), nn("high"), var("?hi")),
        filter(FilterOp::Lt, vec![var("?lo"), var("?hi")]),
    ];
    let bindings = bindings_of(
        engine
            .search(&stages, &SearchOptions::default())
            .await
            .unwrap(),
    );
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].get("?s"), Some(&nn("a")));
}

#[tokio::test]
async fn test_range_filters_on_numeric_values() {
    let store = store_with(&people(20)).await;
    let engine = SearchEngine::new(&store);

    let stages = [
        bgp(var("?s"), nn("age"), var("?age")),
        filter(FilterOp::Gte, vec![var("?age"), num("5")]),
        filter(FilterOp::Lt, vec![var("?age"), num("8")]),
    ];
    let bindings = bindings_of(
        engine
            .search(&stages, &SearchOptions::default())
            .await
            .unwrap(),
    );
    let mut ages: Vec<String> = bindings
        .iter()
        .map(|b| b.get("?age").unwrap().lexical().unwrap().to_string())
        .collect();
    ages.sort();
    assert_eq!(ages, ["5", "6", "7"]);
}

#[tokio::test]
async fn test_starts_with_filter() {
    let quads = [
        Quad::triple(nn("a"), nn("name"), Term::literal("smith-john").unwrap()).unwrap(),
        Quad::triple(nn("b"), nn("name"), Term::literal("smith-jane").unwrap()).unwrap(),
        Quad::triple(nn("c"), nn("name"), Term::literal("jones-jim").unwrap()).unwrap(),
    ];
    let store = store_with(&quads).await;
    let engine = SearchEngine::new(&store);

    let with = [
        bgp(var("?s"), nn("name"), var("?name")),
        filter(
            FilterOp::StartsWith,
            vec![var("?name"), Term::literal("smith-").unwrap()],
        ),
    ];
    assert_eq!(
        engine
            .search(&with, &SearchOptions::default())
            .await
            .unwrap()
            .len(),
        2
    );

    let without = [
        bgp(var("?s"), nn("name"), var("?name")),
        filter(
            FilterOp::StartsWithout,
            vec![var("?name"), Term::literal("smith-").unwrap()],
        ),
    ];
    assert_eq!(
        engine
            .search(&without, &SearchOptions::default())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_project_restricts_variables() {
    let store = store_with(&people(3)).await;
    let engine = SearchEngine::new(&store);

    let stages = [
        bgp(var("?s"), nn("age"), var("?age")),
        SearchStage::Project {
            variables: vec!["?s".to_string()],
        },
    ];
    let SearchResults::Bindings {
        variables,
        bindings,
        ..
    } = engine
        .search(&stages, &SearchOptions::default())
        .await
        .unwrap()
    else {
        panic!("expected bindings");
    };
    assert_eq!(variables.len(), 1);
    assert!(bindings.iter().all(|b| b.contains("?s") && !b.contains("?age")));

    let star = [
        bgp(var("?s"), nn("age"), var("?age")),
        SearchStage::Project {
            variables: vec!["*".to_string()],
        },
    ];
    let star_bindings = bindings_of(
        engine
            .search(&star, &SearchOptions::default())
            .await
            .unwrap(),
    );
    assert!(star_bindings.iter().all(|b| b.contains("?s") && b.contains("?age")));
}

#[tokio::test]
async fn test_construct_emits_quads() {
    let store = store_with(&people(3)).await;
    let engine = SearchEngine::new(&store);

    let stages = [
        bgp(var("?s"), nn("age"), var("?age")),
        SearchStage::Construct {
            patterns: vec![
                QuadPattern::new(var("?s"), nn("years"), var("?age")),
                QuadPattern::new(var("?s"), nn("kind"), nn("Person")),
            ],
        },
    ];
    let SearchResults::Quads(quads) = engine
        .search(&stages, &SearchOptions::default())
        .await
        .unwrap()
    else {
        panic!("expected quads");
    };
    assert_eq!(quads.len(), 6);
    assert!(quads
        .iter()
        .all(|q| q.predicate == nn("years") || q.predicate == nn("kind")));
    assert!(quads.iter().all(|q| q.graph == Term::DefaultGraph));
}

#[tokio::test]
async fn test_limit_and_offset_apply_to_final_output() {
    let store = store_with(&people(10)).await;
    let engine = SearchEngine::new(&store);

    let stages = [bgp(var("?s"), nn("age"), var("?age"))];
    let all = bindings_of(
        engine
            .search(&stages, &SearchOptions::default())
            .await
            .unwrap(),
    );
    let page = bindings_of(
        engine
            .search(&stages, &SearchOptions::new().with_offset(2).with_limit(3))
            .await
            .unwrap(),
    );
    assert_eq!(page.len(), 3);
    assert_eq!(page[..], all[2..5]);
}

/// Naive reference evaluation: cross-product of per-stage matches, merged
/// on shared variables, filters applied afterwards.
async fn naive_join(
    store: &QuadStore<MemoryBackend>,
    bgps: &[SearchStage],
    filters: &[(FilterOp, Term, Term)],
) -> Vec<Binding> {
    let engine = SearchEngine::new(store);
    let mut solutions: Vec<Binding> = vec![Binding::new()];
    for stage in bgps {
        let stage_bindings = bindings_of(
            engine
                .search(
                    std::slice::from_ref(stage),
                    &SearchOptions::new().without_optimizer(),
                )
                .await
                .unwrap(),
        );
        let mut next = Vec::new();
        for left in &solutions {
            for right in &stage_bindings {
                let compatible = right
                    .iter()
                    .all(|(var, term)| left.get(var).map_or(true, |t| t == term));
                if compatible {
                    next.push(left.merged(right));
                }
            }
        }
        solutions = next;
    }
    solutions.retain(|binding| {
        filters.iter().all(|(op, a, b)| {
            let resolve = |t: &Term| match t {
                Term::Variable { name } => binding.get(name).cloned(),
                other => Some(other.clone()),
            };
            let (Some(a), Some(b)) = (resolve(a), resolve(b)) else {
                return false;
            };
            let (a, b) = (encode_term(&a).unwrap(), encode_term(&b).unwrap());
            match op {
                FilterOp::Lt => a < b,
                FilterOp::Lte => a <= b,
                FilterOp::Gt => a > b,
                FilterOp::Gte => a >= b,
                FilterOp::Eq => a == b,
                FilterOp::Neq => a != b,
                FilterOp::StartsWith => a.starts_with(&b),
                FilterOp::StartsWithout => !a.starts_with(&b),
            }
        })
    });
    solutions
}

fn as_sorted_keys(bindings: &[Binding]) -> Vec<String> {
    let mut keys: Vec<String> = bindings
        .iter()
        .map(|b| {
            let mut pairs: Vec<String> =
                b.iter().map(|(v, t)| format!("{v}={t}")).collect();
            pairs.sort();
            pairs.join("|")
        })
        .collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_join_matches_naive_cross_product() {
    let store = store_with(&people(12)).await;
    let engine = SearchEngine::new(&store);

    let bgps = [
        bgp(var("?s"), nn("age"), var("?age")),
        bgp(var("?s"), nn("team"), var("?team")),
    ];
    let filters = [(FilterOp::Gt, var("?age"), num("3"))];

    let mut stages: Vec<SearchStage> = bgps.to_vec();
    stages.push(filter(FilterOp::Gt, vec![var("?age"), num("3")]));

    let executed = bindings_of(
        engine
            .search(&stages, &SearchOptions::default())
            .await
            .unwrap(),
    );
    let reference = naive_join(&store, &bgps, &filters).await;

    assert_eq!(as_sorted_keys(&executed), as_sorted_keys(&reference));
    assert!(!executed.is_empty());
}

#[tokio::test]
async fn test_optimizer_does_not_change_results() {
    let store = store_with(&people(15)).await;
    let engine = SearchEngine::new(&store);

    let pipelines: Vec<Vec<SearchStage>> = vec![
        vec![
            bgp(var("?s"), nn("age"), var("?age")),
            bgp(var("?s"), nn("team"), nn("evens")),
            filter(FilterOp::Lte, vec![var("?age"), num("9")]),
        ],
        vec![
            bgp(var("?s"), nn("name"), var("?name")),
            bgp(var("?s"), nn("age"), var("?age")),
            filter(FilterOp::Gte, vec![num("4"), var("?age")]),
            SearchStage::Project {
                variables: vec!["?name".to_string()],
            },
        ],
    ];

    for stages in pipelines {
        let optimized = bindings_of(
            engine
                .search(&stages, &SearchOptions::default())
                .await
                .unwrap(),
        );
        let plain = bindings_of(
            engine
                .search(&stages, &SearchOptions::new().without_optimizer())
                .await
                .unwrap(),
        );
        assert_eq!(as_sorted_keys(&optimized), as_sorted_keys(&plain));
        assert!(!optimized.is_empty());
    }
}

#[tokio::test]
async fn test_bgp_without_variables_acts_as_guard() {
    let quads = [
        Quad::triple(nn("s"), nn("flag"), nn("on")).unwrap(),
        Quad::triple(nn("s"), nn("p"), nn("o")).unwrap(),
    ];
    let store = store_with(&quads).await;
    let engine = SearchEngine::new(&store);

    let present = [
        bgp(var("?s"), nn("p"), var("?o")),
        bgp(nn("s"), nn("flag"), nn("on")),
    ];
    assert_eq!(
        engine
            .search(&present, &SearchOptions::default())
            .await
            .unwrap()
            .len(),
        1
    );

    let absent = [
        bgp(var("?s"), nn("p"), var("?o")),
        bgp(nn("s"), nn("flag"), nn("off")),
    ];
    assert!(engine
        .search(&absent, &SearchOptions::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_sorting_metadata_reflects_scan_order() {
    let store = store_with(&people(5)).await;
    let engine = SearchEngine::new(&store);

    // Predicate-bound scan runs over POGS: objects drive the order, so the
    // object variable leads the sorting.
    let stages = [bgp(var("?s"), nn("age"), var("?age"))];
    let SearchResults::Bindings { sorting, .. } = engine
        .search(&stages, &SearchOptions::default())
        .await
        .unwrap()
    else {
        panic!("expected bindings");
    };
    assert_eq!(sorting.first().map(AsRef::as_ref), Some("?age"));
}
