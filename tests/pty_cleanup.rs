//! Kept in its own test binary so no other test opens descriptors meanwhile.

#[cfg(target_os = "linux")]
mod common;

#[cfg(target_os = "linux")]
mod pty_cleanup {
    use crate::common::{secs, sh, write_executable};
    use claude_pty_run::pty::{InvocationSpec, PtyRunner, RunnerError};
    use std::thread;
    use std::time::Duration;

    fn open_fds() -> usize {
        std::fs::read_dir("/proc/self/fd")
            .expect("Failed to list /proc/self/fd")
            .count()
    }

    #[test]
    fn no_descriptors_leak_across_outcomes() {
        let runner = PtyRunner::new();
        let dir = tempfile::tempdir().unwrap();
        // Passes every pre-spawn check, then fails to exec after the PTY exists.
        let broken = write_executable(dir.path(), "broken", "#!no-such-interp-51aa\n");
        // Warm up lazily-initialized std handles.
        let _ = runner.run(&sh("true"));
        thread::sleep(Duration::from_millis(200));
        let before = open_fds();

        for _ in 0..3 {
            runner.run(&sh("echo hi; exit 2")).unwrap();
            runner
                .run(&sh("sleep 30").with_timeout_secs(secs(1)))
                .unwrap();
            runner
                .run(&sh("true").with_working_directory("/definitely/not/here"))
                .unwrap_err();
            runner
                .run(&InvocationSpec::new("no-such-tool-b81c", Vec::new()))
                .unwrap_err();
            let err = runner
                .run(&InvocationSpec::new(&broken, Vec::new()))
                .unwrap_err();
            assert!(matches!(err, RunnerError::Spawn { .. }), "got: {err:?}");
        }

        thread::sleep(Duration::from_millis(300));
        let after = open_fds();
        assert!(after <= before, "fds before: {before}, after: {after}");
    }
}
