//! The background resource monitor (§4.2): polls the child's working set
//! every 250 ms and kills it (and any children it spawned) on breach of the
//! 128 MiB memory cap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Poll cadence for the resource monitor (§4.2, §5).
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Working-set cap before the child is killed (§3, §4.2, §5).
pub const MEMORY_CAP_BYTES: u64 = 128 * 1024 * 1024;

/// Shared flag the monitor sets once it has killed the child for exceeding
/// its memory cap. [`crate::session::ContractExecutionSession`] checks this
/// before attempting further I/O so a breach surfaces promptly instead of
/// hanging on a read from a pipe whose writer just died.
pub type MemoryBreachFlag = Arc<AtomicBool>;

/// Spawns the polling task. Returns the flag it sets on breach and a handle
/// the session cancels on ordinary dispose.
pub fn spawn(
    pid: u32,
    cap_bytes: u64,
    child: Arc<Mutex<tokio::process::Child>>,
) -> (MemoryBreachFlag, JoinHandle<()>) {
    let breached = Arc::new(AtomicBool::new(false));
    let breached_task = Arc::clone(&breached);
    let handle = tokio::spawn(async move {
        let mut system = System::new();
        let target = Pid::from_u32(pid);
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
            let Some(process) = system.process(target) else {
                // Process already exited on its own; nothing left to police.
                break;
            };
            let working_set = total_working_set(&system, target);
            if working_set > cap_bytes {
                warn!(
                    pid,
                    working_set, cap_bytes, "sandbox exceeded memory cap, killing"
                );
                breached_task.store(true, Ordering::SeqCst);
                kill_tree(&system, target);
                let mut guard = child.lock().await;
                if let Err(e) = guard.start_kill() {
                    error!(pid, error = %e, "failed to kill sandbox child after memory breach");
                }
                break;
            }
            let _ = process; // keep borrow scoped; avoids holding across await above
        }
    });
    (breached, handle)
}

/// Sums the working-set memory of `root` and every process whose parent
/// chain leads back to it, matching "kill along with any children it
/// spawned" (§4.2).
fn total_working_set(system: &System, root: Pid) -> u64 {
    let mut total = system.process(root).map(|p| p.memory()).unwrap_or(0);
    for process in system.processes().values() {
        if is_descendant(system, process.pid(), root) {
            total += process.memory();
        }
    }
    total
}

fn kill_tree(system: &System, root: Pid) {
    for process in system.processes().values() {
        if is_descendant(system, process.pid(), root) {
            process.kill();
        }
    }
    if let Some(process) = system.process(root) {
        process.kill();
    }
}

fn is_descendant(system: &System, candidate: Pid, root: Pid) -> bool {
    let mut current = candidate;
    loop {
        if current == root {
            return candidate != root;
        }
        match system.process(current).and_then(sysinfo::Process::parent) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}
