#![cfg(unix)]

mod common;
use crate::common::builders::ScriptDir;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;

use serde_json::json;
use tokio::sync::mpsc;

use scriptrun::exec::{Orchestrator, OutputLine, OutputSource};
use scriptrun::request::ExecutionRequest;
use scriptrun::types::ExecutionStatus;

type TestResult = Result<(), Box<dyn Error>>;

fn texts(lines: &[OutputLine], source: OutputSource) -> Vec<String> {
    lines
        .iter()
        .filter(|l| l.source == source)
        .map(|l| l.text.clone())
        .collect()
}

#[tokio::test]
async fn both_streams_are_captured_in_order() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = ScriptDir::new().with_script(
            "mixed.sh",
            "echo out-1\necho err-1 >&2\necho out-2\necho err-2 >&2\necho out-3\n",
        );
        let orchestrator = Orchestrator::new(dir.settings().build());

        let result = orchestrator
            .run(&ExecutionRequest::new("mixed.sh", json!({})))
            .await;

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.lines.len(), 5);
        assert_eq!(
            texts(&result.lines, OutputSource::Stdout),
            ["out-1", "out-2", "out-3"]
        );
        assert_eq!(texts(&result.lines, OutputSource::Stderr), ["err-1", "err-2"]);
        for line in ["out-1\n", "out-2\n", "out-3\n", "err-1\n", "err-2\n"] {
            assert!(result.output.contains(line), "missing {line:?} in {:?}", result.output);
        }
        assert_eq!(result.http_status(), 200);
        assert_eq!(orchestrator.spawned_count(), 1);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn heavy_output_on_both_pipes_does_not_deadlock() -> TestResult {
    with_timeout(async {
        init_tracing();

        // Well past a pipe buffer on each stream.
        let dir = ScriptDir::new().with_script(
            "flood.sh",
            r#"i=0
while [ $i -lt 20000 ]; do
  echo "stdout line $i"
  echo "stderr line $i" >&2
  i=$((i+1))
done
"#,
        );
        let orchestrator = Orchestrator::new(dir.settings().build());

        let result = orchestrator
            .run(&ExecutionRequest::new("flood.sh", json!({})))
            .await;

        assert_eq!(result.status, ExecutionStatus::Success);
        let stdout = texts(&result.lines, OutputSource::Stdout);
        let stderr = texts(&result.lines, OutputSource::Stderr);
        assert_eq!(stdout.len(), 20000);
        assert_eq!(stderr.len(), 20000);
        for (i, (o, e)) in stdout.iter().zip(&stderr).enumerate() {
            assert_eq!(o, &format!("stdout line {i}"));
            assert_eq!(e, &format!("stderr line {i}"));
        }

        Ok(())
    })
    .await
}

#[tokio::test]
async fn parameter_file_is_the_only_argument() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = ScriptDir::new().with_script(
            "args.sh",
            "echo \"argc=$#\"\ncat \"$1\"\necho\n",
        );
        let orchestrator = Orchestrator::new(dir.settings().build());

        let params = json!({"images": ["a", "b"], "threshold": 0.5});
        let result = orchestrator
            .run(&ExecutionRequest::new("args.sh", params.clone()))
            .await;

        assert!(result.is_success(), "{}", result.output);
        let stdout = texts(&result.lines, OutputSource::Stdout);
        assert_eq!(stdout[0], "argc=1");
        let echoed: serde_json::Value = serde_json::from_str(&stdout[1])?;
        assert_eq!(echoed, params);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn lines_are_streamed_to_the_sink_while_running() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = ScriptDir::new().with_script("talk.sh", "echo hello\necho oops >&2\n");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let orchestrator = Orchestrator::new(dir.settings().build()).with_line_sink(tx);

        let result = orchestrator
            .run(&ExecutionRequest::new("talk.sh", json!({})))
            .await;
        assert!(result.is_success());

        let mut streamed = Vec::new();
        while let Ok(line) = rx.try_recv() {
            streamed.push(line);
        }
        assert_eq!(streamed.len(), 2);
        assert!(streamed.contains(&OutputLine::stdout("hello")));
        assert!(streamed.contains(&OutputLine::stderr("oops")));

        Ok(())
    })
    .await
}

#[tokio::test]
async fn unterminated_and_non_utf8_lines_are_kept() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = ScriptDir::new().with_script(
            "odd.sh",
            "printf 'caf\\351\\n'\nprintf 'no newline at end'\n",
        );
        let orchestrator = Orchestrator::new(dir.settings().build());

        let result = orchestrator
            .run(&ExecutionRequest::new("odd.sh", json!({})))
            .await;

        assert!(result.is_success(), "{}", result.output);
        assert_eq!(
            texts(&result.lines, OutputSource::Stdout),
            ["caf\u{fffd}", "no newline at end"]
        );

        Ok(())
    })
    .await
}

#[tokio::test]
async fn executable_scripts_run_without_an_interpreter() -> TestResult {
    use std::os::unix::fs::PermissionsExt;

    with_timeout(async {
        init_tracing();

        let dir = ScriptDir::new();
        let path = dir.write_script("direct.sh", "#!/bin/sh\necho direct \"$#\"\n");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;

        let orchestrator = Orchestrator::new(dir.settings().no_interpreter().build());
        let result = orchestrator
            .run(&ExecutionRequest::new("direct.sh", json!({})))
            .await;

        assert!(result.is_success(), "{}", result.output);
        assert_eq!(result.output, "direct 1\n");

        Ok(())
    })
    .await
}

#[tokio::test]
async fn interpreter_args_precede_the_script() -> TestResult {
    with_timeout(async {
        init_tracing();

        // `sh -e` aborts on the first failing command.
        let dir = ScriptDir::new().with_script("strict.sh", "echo before\nfalse\necho after\n");
        let orchestrator = Orchestrator::new(dir.settings().interpreter_arg("-e").build());

        let result = orchestrator
            .run(&ExecutionRequest::new("strict.sh", json!({})))
            .await;

        assert_eq!(result.status, ExecutionStatus::Error);
        assert_eq!(result.exit_code, Some(1));
        assert_eq!(texts(&result.lines, OutputSource::Stdout), ["before"]);

        Ok(())
    })
    .await
}
