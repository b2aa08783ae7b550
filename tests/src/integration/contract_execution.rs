//! End-to-end scenarios 1 and 2 (§8): the safety analyzer and the
//! executor/sandbox pipeline wired together exactly as the dispatcher's
//! `VerifyCode`/contract-compile path would use them.

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use qc_executor::{ContractExecutor, ExecutorError};

    fn host_path() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_qc-sandbox-host"))
    }

    /// Scenario 1: source contains a forbidden filesystem call. The
    /// analyzer must reject before a sandbox process is ever spawned.
    #[tokio::test]
    async fn rejects_file_access_before_touching_a_sandbox() {
        const MALICIOUS: &str = r#"
            class Exfil {
                void Run() {
                    System.IO.File.ReadAllText("/etc/passwd");
                }
            }
        "#;

        let executor = ContractExecutor::new(host_path());
        let err = executor.compile(MALICIOUS).await.unwrap_err();
        match err {
            ExecutorError::Rejected(reason) => {
                let msg = reason.to_string();
                assert!(
                    msg.contains("ReadAllText") || msg.contains("File"),
                    "rejection should name the offending construct: {msg}"
                );
            }
            other => panic!("expected a safety rejection, got {other:?}"),
        }
    }

    /// Scenario 2: a benign contract compiles, accepts state, and executes.
    #[tokio::test]
    async fn benign_contract_executes_and_threads_state_through() {
        const BENIGN: &str = r#"
            fn run(inputs, state) {
                #{ result: "ok", state: state + "-executed" }
            }
        "#;

        let executor = ContractExecutor::new(host_path());
        let mut session = executor.compile(BENIGN).await.unwrap();
        let state = executor.transfer_state(&mut session, "initial").await;
        assert_eq!(state, "initial");

        let result = executor.execute(&mut session, Vec::new(), &state).await;
        assert_eq!(result.result, "ok");
        assert_eq!(result.serialized_state, "initial-executed");
        session.dispose().await;
    }
}
