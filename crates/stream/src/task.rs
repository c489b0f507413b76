use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

/// State shared between a task's worker thread and its handle.
struct TaskState<T> {
    complete: Mutex<bool>,
    fraction: Mutex<Option<f32>>,
    result: Mutex<Option<T>>,
}

/// Progress reporter handed to a running job.
pub struct Progress<T> {
    state: Arc<TaskState<T>>,
}

impl<T> Progress<T> {
    /// Report progress; clamped to `[0, 1]`.
    pub fn set(&self, fraction: f32) {
        *self.state.fraction.lock() = Some(fraction.clamp(0.0, 1.0));
    }
}

/// Handle to a job running on a worker thread.
///
/// Every query polls without blocking. Tasks cannot be cancelled; a job runs
/// to completion once spawned.
pub struct TaskHandle<T> {
    name: String,
    state: Arc<TaskState<T>>,
    thread: Option<JoinHandle<()>>,
    panicked: bool,
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("complete", &self.is_complete())
            .field("fraction", &self.fraction())
            .finish()
    }
}

/// Run `job` on a new worker thread named `name`.
pub fn spawn_task<T, F>(name: &str, job: F) -> std::io::Result<TaskHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(&Progress<T>) -> T + Send + 'static,
{
    let state = Arc::new(TaskState {
        complete: Mutex::new(false),
        fraction: Mutex::new(None),
        result: Mutex::new(None),
    });
    let progress = Progress {
        state: Arc::clone(&state),
    };
    let task_name = name.to_string();
    let thread = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            tracing::debug!(task = %task_name, "task started");
            let output = job(&progress);
            *progress.state.result.lock() = Some(output);
            *progress.state.complete.lock() = true;
            tracing::debug!(task = %task_name, "task complete");
        })?;
    Ok(TaskHandle {
        name: name.to_string(),
        state,
        thread: Some(thread),
        panicked: false,
    })
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_complete(&self) -> bool {
        *self.state.complete.lock()
    }

    /// Last reported progress, if the job reports any.
    pub fn fraction(&self) -> Option<f32> {
        *self.state.fraction.lock()
    }

    /// The job panicked; it will never complete. Known once
    /// [`Self::take_result`] has observed the worker exit.
    pub fn panicked(&self) -> bool {
        self.panicked
    }

    /// The job's output, once. `None` while running or after it was taken.
    pub fn take_result(&mut self) -> Option<T> {
        if !self.is_complete() {
            if self.thread.as_ref().is_some_and(JoinHandle::is_finished) {
                self.reap();
            }
            return None;
        }
        let result = self.state.result.lock().take();
        if result.is_some() {
            self.reap();
        }
        result
    }

    fn reap(&mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            self.panicked = true;
            tracing::error!(task = %self.name, "task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn wait<T>(handle: &TaskHandle<T>) {
        for _ in 0..1000 {
            if handle.is_complete() {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("task {} did not complete", handle.name());
    }

    #[test]
    fn result_is_taken_once() {
        let mut handle = spawn_task("sum", |_| (1..=10).sum::<u32>()).unwrap();
        wait(&handle);
        assert_eq!(handle.take_result(), Some(55));
        assert_eq!(handle.take_result(), None);
        assert!(handle.is_complete());
    }

    #[test]
    fn polling_does_not_block() {
        let (release, gate) = mpsc::channel::<()>();
        let mut handle = spawn_task("gated", move |progress| {
            progress.set(0.5);
            gate.recv().ok();
            progress.set(2.0);
            "done"
        })
        .unwrap();

        assert!(!handle.is_complete());
        assert_eq!(handle.take_result(), None);

        release.send(()).unwrap();
        wait(&handle);
        assert_eq!(handle.fraction(), Some(1.0));
        assert_eq!(handle.take_result(), Some("done"));
    }

    #[test]
    fn panicking_job_is_reported() {
        let mut handle = spawn_task("boom", |_| -> u32 { panic!("boom") }).unwrap();
        for _ in 0..1000 {
            if handle.take_result().is_none() && handle.panicked() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert!(handle.panicked());
        assert!(!handle.is_complete());
    }

    #[test]
    fn progress_starts_unknown() {
        let handle = spawn_task("quiet", |_| ()).unwrap();
        wait(&handle);
        assert_eq!(handle.fraction(), None);
        assert!(format!("{handle:?}").contains("quiet"));
    }
}
