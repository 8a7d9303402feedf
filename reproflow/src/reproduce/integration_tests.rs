//! End-to-end reproduction scenarios.

#[cfg(test)]
mod tests {
    use crate::errors::ReproflowError;
    use crate::events::CollectingEventSink;
    use crate::graph::{DependencyGraph, EvaluationPlan};
    use crate::reproduce::{ReproduceOptions, Repository};
    use crate::stages::StageRef;
    use crate::testing::{assert_respects_dependencies, diamond_graph_with, CallLog, RecordingStage};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn diamond_repo(log: &CallLog, sink: &Arc<CollectingEventSink>) -> Repository {
        Repository::new(diamond_graph_with(|name| RecordingStage::new(name).with_log(log)))
            .with_event_sink(sink.clone())
    }

    fn plan_of(log: &CallLog) -> EvaluationPlan {
        let stages = log
            .reproduced()
            .iter()
            .map(|a| Arc::new(RecordingStage::new(a.as_str())) as StageRef)
            .collect();
        EvaluationPlan::from_stages(stages)
    }

    #[tokio::test]
    async fn test_upstream_of_d() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let repo = diamond_repo(&log, &sink);

        let result = repo.reproduce("D", ReproduceOptions::default()).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(log.reproduced(), vec!["A", "B", "C", "D"]);
        assert_respects_dependencies(repo.graph(), &plan_of(&log));
        assert!(log.persisted().is_empty());
    }

    #[tokio::test]
    async fn test_downstream_of_b() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let repo = diamond_repo(&log, &sink);

        repo.reproduce("B", ReproduceOptions::new().with_downstream(true))
            .await
            .unwrap();

        assert_eq!(log.reproduced(), vec!["B", "D", "E"]);
    }

    #[tokio::test]
    async fn test_frozen_d_runs_alone() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let graph = diamond_graph_with(|name| RecordingStage::new(name).frozen(name == "D").with_log(&log));
        let repo = Repository::new(graph).with_event_sink(sink.clone());

        repo.reproduce("D", ReproduceOptions::default()).await.unwrap();

        assert_eq!(log.reproduced(), vec!["D"]);
        assert_eq!(log.reproduce_calls()[0].upstream, Vec::<String>::new());
        assert_eq!(sink.stages_for("stage.frozen"), vec!["D"]);
        // The caller's graph keeps the frozen stage's edges.
        assert!(repo.graph().has_dependency("D", "B"));
    }

    #[tokio::test]
    async fn test_frozen_stage_blocks_downstream_expansion() {
        let log = CallLog::new();
        let graph = diamond_graph_with(|name| RecordingStage::new(name).frozen(name == "D").with_log(&log));
        let repo = Repository::new(graph);

        repo.reproduce("B", ReproduceOptions::new().with_downstream(true))
            .await
            .unwrap();

        assert_eq!(log.reproduced(), vec!["B"]);
    }

    #[tokio::test]
    async fn test_unsupported_run_cache_warns_and_continues() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let repo = diamond_repo(&log, &sink);

        repo.reproduce("B", ReproduceOptions::new().with_pull(true))
            .await
            .unwrap();

        assert_eq!(log.reproduced(), vec!["A", "B"]);
        let types = sink.event_types();
        assert_eq!(types[0], "run_cache.pull_started");
        assert_eq!(types[1], "run_cache.pull_unsupported");
        assert_eq!(types[2], "reproduce.started");
    }

    #[tokio::test]
    async fn test_failure_in_middle_of_chain() {
        let log = CallLog::new();
        let make = |stage: RecordingStage| Arc::new(stage.with_log(&log)) as StageRef;
        let graph = DependencyGraph::from_parts(
            [
                make(RecordingStage::new("one").changed(true)),
                make(RecordingStage::new("two").failing("command exited with 2")),
                make(RecordingStage::new("three")),
            ],
            [("two", "one"), ("three", "two")],
        )
        .unwrap();
        let repo = Repository::new(graph);

        let err = repo.reproduce("three", ReproduceOptions::default()).await.unwrap_err();

        assert_eq!(err.stage_address(), Some("two"));
        assert_eq!(err.to_string(), "failed to reproduce 'two'");
        assert_eq!(log.reproduced(), vec!["one", "two"]);
        assert_eq!(log.persisted(), vec!["one"]);
        let ReproflowError::Reproduction(inner) = err else {
            panic!("expected a reproduction failure");
        };
        assert_eq!(inner.source.to_string(), "command exited with 2");
    }

    #[tokio::test]
    async fn test_force_downstream_after_first_change() {
        let log = CallLog::new();
        let graph = diamond_graph_with(|name| RecordingStage::new(name).changed(name == "C").with_log(&log));
        let repo = Repository::new(graph);

        let result = repo
            .reproduce("E", ReproduceOptions::new().with_force_downstream(true))
            .await
            .unwrap();

        let forced: Vec<(String, bool)> = log
            .reproduce_calls()
            .into_iter()
            .map(|c| (c.address, c.flags.force))
            .collect();
        let expected: Vec<(String, bool)> = [
            ("A", false),
            ("B", false),
            ("C", false),
            ("D", true),
            ("G", true),
            ("F", true),
            ("E", true),
        ]
        .iter()
        .map(|(a, f)| ((*a).to_string(), *f))
        .collect();
        assert_eq!(forced, expected);
        assert_eq!(result.addresses(), vec!["C", "D", "G", "F", "E"]);
    }

    #[tokio::test]
    async fn test_single_item_runs_only_the_target() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let repo = diamond_repo(&log, &sink);

        repo.reproduce("D", ReproduceOptions::new().with_single_item(true).with_force(true))
            .await
            .unwrap();

        assert_eq!(log.reproduced(), vec!["D"]);
        assert_eq!(log.persisted(), vec!["D"]);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_persisting() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let repo = diamond_repo(&log, &sink);

        let result = repo
            .reproduce("C", ReproduceOptions::new().with_force(true).with_dry(true))
            .await
            .unwrap();

        assert_eq!(result.addresses(), vec!["A", "C"]);
        assert!(log.persisted().is_empty());
        assert!(sink.events_of_type("stage.persisted").is_empty());
    }

    #[tokio::test]
    async fn test_event_sequence_for_one_changed_stage() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let repo = diamond_repo(&log, &sink);

        repo.reproduce("A", ReproduceOptions::new().with_force(true))
            .await
            .unwrap();

        assert_eq!(
            sink.event_types(),
            vec![
                "reproduce.started",
                "stage.started",
                "stage.changed",
                "stage.persisted",
                "reproduce.completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_serialized() {
        let log = CallLog::new();
        let sink = Arc::new(CollectingEventSink::new());
        let repo = Arc::new(diamond_repo(&log, &sink));

        let first = tokio::spawn({
            let repo = repo.clone();
            async move { repo.reproduce("D", ReproduceOptions::default()).await.map(|r| r.len()) }
        });
        let second = tokio::spawn({
            let repo = repo.clone();
            async move { repo.reproduce("F", ReproduceOptions::default()).await.map(|r| r.len()) }
        });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(log.reproduced().len(), 6);
        let runs: Vec<String> = sink
            .event_types()
            .into_iter()
            .filter(|t| t == "reproduce.started" || t == "reproduce.completed")
            .collect();
        // Never two runs open at once.
        assert_eq!(
            runs,
            vec![
                "reproduce.started",
                "reproduce.completed",
                "reproduce.started",
                "reproduce.completed",
            ]
        );
    }
}
