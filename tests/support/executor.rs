//! Scripted executor for driving the lifecycle without real tools.

use std::cell::{Cell, RefCell};
use std::io;

use kindrun::core::exec::{Completion, ExecError, Executor, Invocation};

/// What a matched invocation does.
#[derive(Debug, Clone)]
pub enum Response {
    /// Exit with this code and no output.
    Exit(i32),
    /// Exit 0 printing this to stdout.
    Stdout(String),
    /// Fail to start.
    Spawn,
    /// Behave as if the process received this signal: this and every later
    /// interruptible invocation fail with `Interrupted`.
    Signal(i32),
    /// Panic inside the executor.
    Panic,
}

/// Executor that answers from a script and records every invocation.
///
/// Rules match on the rendered command line prefix; the most recently added
/// matching rule wins. Unmatched commands exit 0 with no output.
pub struct ScriptedExecutor {
    rules: Vec<(String, Response)>,
    calls: RefCell<Vec<Invocation>>,
    missing: Vec<String>,
    signal: Cell<Option<i32>>,
}

impl ScriptedExecutor {
    /// A script where every tool succeeds and the cluster has two nodes.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: RefCell::new(Vec::new()),
            missing: Vec::new(),
            signal: Cell::new(None),
        }
        .on("kind get kubeconfig", Response::Stdout("apiVersion: v1\n".to_string()))
        .on(
            "kind get nodes",
            Response::Stdout("node-control-plane\nnode-worker\n".to_string()),
        )
        .on("aws ecr get-login-password", Response::Stdout("stub-token\n".to_string()))
    }

    pub fn on(mut self, prefix: &str, response: Response) -> Self {
        self.rules.push((prefix.to_string(), response));
        self
    }

    /// Pretend `program` is not installed.
    pub fn without(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Rendered command lines in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Number of calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Index of the first call starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    fn response_for(&self, line: &str) -> Option<Response> {
        self.rules
            .iter()
            .rev()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone())
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<Completion, ExecError> {
        self.calls.borrow_mut().push(invocation.clone());

        if invocation.interruptible {
            if let Some(signal) = self.signal.get() {
                return Err(ExecError::Interrupted(signal));
            }
        }

        let line = invocation.to_string();
        match self.response_for(&line) {
            None => Ok(Completion {
                code: Some(0),
                stdout: String::new(),
            }),
            Some(Response::Exit(code)) => Ok(Completion {
                code: Some(code),
                stdout: String::new(),
            }),
            Some(Response::Stdout(stdout)) => Ok(Completion {
                code: Some(0),
                stdout,
            }),
            Some(Response::Spawn) => Err(ExecError::Spawn(io::Error::new(
                io::ErrorKind::NotFound,
                "no such file",
            ))),
            Some(Response::Signal(signal)) => {
                self.signal.set(Some(signal));
                Err(ExecError::Interrupted(signal))
            }
            Some(Response::Panic) => panic!("scripted panic running `{}`", line),
        }
    }

    fn locate(&self, program: &str) -> bool {
        !self.missing.iter().any(|m| m == program)
    }
}
