use assert_matches::assert_matches;
use slipstream_core::{
    CompileEvent, CompileFlow, Dag, DriveError, ExitStatus, ProjectName, ReporterConfig, UserMode,
};

mod common;

use common::{harness, project, structured};

#[tokio::test]
async fn a_linear_chain_pipelines_pickles_downstream() {
    let a = Dag::leaf(project("a"));
    let b = Dag::parent(project("b"), vec![a]);
    let c = Dag::parent(project("c"), vec![b]);

    let h = harness(vec![c]);
    let state = h
        .drive
        .compile(
            h.state.clone(),
            &"c".into(),
            ReporterConfig::default(),
            false,
            UserMode::Parallel { batches: 4 },
            true,
            false,
        )
        .await
        .unwrap();

    assert_eq!(state.status(), ExitStatus::Ok);
    for name in ["a", "b", "c"] {
        assert_eq!(h.compiler.count(name), 1, "project {name}");
    }

    // Picklepaths follow the depth-first order of the dependency DAG.
    assert_eq!(h.compiler.picklepath("a"), Vec::<String>::new());
    assert_eq!(h.compiler.picklepath("b"), vec!["pickle:///a"]);
    assert_eq!(h.compiler.picklepath("c"), vec!["pickle:///b", "pickle:///a"]);
}

#[tokio::test]
async fn a_diamond_schedules_every_node_exactly_once() {
    let a = Dag::leaf(project("a"));
    let b = Dag::parent(project("b"), vec![a.clone()]);
    let c = Dag::parent(project("c"), vec![a.clone()]);
    let d = Dag::parent(project("d"), vec![b, c]);

    let h = harness(vec![d]);
    let state = h
        .drive
        .compile(
            h.state.clone(),
            &"d".into(),
            ReporterConfig::default(),
            false,
            UserMode::Parallel { batches: 4 },
            true,
            false,
        )
        .await
        .unwrap();

    assert_eq!(state.status(), ExitStatus::Ok);
    for name in ["a", "b", "c", "d"] {
        assert_eq!(h.compiler.count(name), 1, "project {name}");
    }

    // The shared leaf appears once, after the first parent that reaches it.
    assert_eq!(
        h.compiler.picklepath("d"),
        vec!["pickle:///b", "pickle:///a", "pickle:///c"]
    );
}

#[tokio::test]
async fn a_failed_leaf_blocks_its_dependents() {
    let a = Dag::leaf(project("a"));
    let b = Dag::parent(project("b"), vec![a]);

    let h = harness(vec![b]);
    h.compiler.fail("a");

    let mut consumer = h.state.channel().consumer();
    let state = h
        .drive
        .compile(
            h.state.clone(),
            &"b".into(),
            structured(),
            false,
            UserMode::Parallel { batches: 4 },
            true,
            false,
        )
        .await
        .unwrap();

    assert_eq!(state.status(), ExitStatus::CompilationError);
    assert_eq!(h.compiler.count("a"), 1);
    assert_eq!(h.compiler.count("b"), 0);

    let blocked = state.results().latest(&"b".into()).unwrap();
    assert_matches!(
        blocked.flow,
        CompileFlow::Blocked { ref blocking } if *blocking == vec![ProjectName::from("a")]
    );

    let events = consumer.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        CompileEvent::ProjectBlocked { project, .. } if project == &"b".into()
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        CompileEvent::ProjectFailed { project, .. } if project == &"a".into()
    )));
}

#[tokio::test]
async fn non_pipelined_traversal_pre_completes_every_promise() {
    let a = Dag::leaf(project("a"));
    let b = Dag::parent(project("b"), vec![a]);

    let h = harness(vec![b]);
    let mut consumer = h.state.channel().consumer();
    let state = h
        .drive
        .compile(
            h.state.clone(),
            &"b".into(),
            structured(),
            false,
            UserMode::Sequential,
            false,
            false,
        )
        .await
        .unwrap();

    assert_eq!(state.status(), ExitStatus::Ok);
    for name in ["a", "b"] {
        assert!(h.compiler.picklepath(name).is_empty());
        assert!(h.compiler.pickle_was_precompleted(name));
        assert!(h.compiler.java_was_precompleted(name));
    }

    // Opting out of pipelining never warns.
    assert!(!consumer
        .drain()
        .iter()
        .any(|e| matches!(e, CompileEvent::PipeliningNotUsed { .. })));
}

#[tokio::test]
async fn an_aggregate_with_a_failure_blocks_its_parent() {
    let x = Dag::leaf(project("x"));
    let y = Dag::leaf(project("y"));
    let aggregate = Dag::aggregate(vec![x, y]);
    let p = Dag::parent(project("p"), vec![aggregate]);

    let h = harness(vec![p]);
    h.compiler.fail("y");

    let state = h
        .drive
        .compile(
            h.state.clone(),
            &"p".into(),
            ReporterConfig::default(),
            false,
            UserMode::Parallel { batches: 4 },
            true,
            false,
        )
        .await
        .unwrap();

    assert_eq!(state.status(), ExitStatus::CompilationError);
    assert_eq!(h.compiler.count("x"), 1);
    assert_eq!(h.compiler.count("y"), 1);
    assert_eq!(h.compiler.count("p"), 0);

    let blocked = state.results().latest(&"p".into()).unwrap();
    assert_matches!(
        blocked.flow,
        CompileFlow::Blocked { ref blocking } if *blocking == vec![ProjectName::from("y")]
    );
}

#[tokio::test]
async fn sequential_mode_skips_scheduling_after_a_prior_failure() {
    let u = Dag::leaf(project("u"));
    let r = Dag::parent(project("r"), vec![u]);

    let h = harness(vec![r]);

    // Seed the cache with a failed outcome for the dependency.
    h.compiler.fail("u");
    let state = h
        .drive
        .compile(
            h.state.clone(),
            &"u".into(),
            ReporterConfig::default(),
            false,
            UserMode::Sequential,
            false,
            false,
        )
        .await
        .unwrap();
    assert_eq!(state.status(), ExitStatus::CompilationError);
    assert_eq!(h.compiler.count("u"), 1);

    let mut consumer = state.channel().consumer();
    consumer.drain();

    let state = h
        .drive
        .compile(
            state,
            &"r".into(),
            structured(),
            true,
            UserMode::Sequential,
            false,
            false,
        )
        .await
        .unwrap();

    assert_eq!(state.status(), ExitStatus::CompilationError);
    // Neither the root nor the failed dependency was compiled again.
    assert_eq!(h.compiler.count("u"), 1);
    assert_eq!(h.compiler.count("r"), 0);

    let events = consumer.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        CompileEvent::SequentialGateTripped { failed } if *failed == vec![ProjectName::from("u")]
    )));
}

#[tokio::test]
async fn exclude_root_compiles_only_the_dependencies() {
    let a = Dag::leaf(project("a"));
    let b = Dag::parent(project("b"), vec![a]);
    let c = Dag::parent(project("c"), vec![b]);

    let h = harness(vec![c]);
    let state = h
        .drive
        .compile(
            h.state.clone(),
            &"c".into(),
            ReporterConfig::default(),
            false,
            UserMode::Parallel { batches: 4 },
            true,
            true,
        )
        .await
        .unwrap();

    assert_eq!(state.status(), ExitStatus::Ok);
    assert_eq!(h.compiler.count("a"), 1);
    assert_eq!(h.compiler.count("b"), 1);
    assert_eq!(h.compiler.count("c"), 0);
}

#[tokio::test]
async fn an_unknown_root_is_a_drive_error() {
    let h = harness(vec![Dag::leaf(project("a"))]);
    let err = h
        .drive
        .compile(
            h.state.clone(),
            &"missing".into(),
            ReporterConfig::default(),
            false,
            UserMode::Sequential,
            false,
            false,
        )
        .await
        .unwrap_err();

    assert_matches!(err, DriveError::UnknownProject(name) if name == "missing".into());
}
