//! Scripted command runner shared by the instantiation tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cartridge_provision::{CommandOutput, CommandRunner, CommandSpec, Error, Result, SystemRunner};

type Step = Box<dyn Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync>;

/// Plays back one scripted step per command and records every call.
///
/// Clones share the same script and call log, so a test can keep one clone
/// after handing another to an `Instantiator`.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, step: impl Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync + 'static) -> Self {
        self.steps.lock().unwrap().push_back(Box::new(step));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::program_name).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted step for `{spec}`"));
        step(spec)
    }
}

/// The argument following `flag`.
pub fn arg_after(spec: &CommandSpec, flag: &str) -> PathBuf {
    let args = spec.arg_strings();
    let pos = args
        .iter()
        .position(|a| a == flag)
        .unwrap_or_else(|| panic!("`{spec}` has no {flag}"));
    PathBuf::from(&args[pos + 1])
}

/// The directory an extraction command unpacks into.
pub fn extraction_target(spec: &CommandSpec) -> PathBuf {
    match spec.program_name().as_str() {
        "unzip" => arg_after(spec, "-d"),
        _ => arg_after(spec, "-C"),
    }
}

/// A curl step that writes `body` to the requested output file.
pub fn serve(body: &'static [u8]) -> impl Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync {
    move |spec: &CommandSpec| {
        fs::write(arg_after(spec, "--output"), body).unwrap();
        Ok(CommandOutput::default())
    }
}

/// An extraction step that creates `files` under the extraction target.
/// Paths ending in `bin/control` are made executable.
pub fn unpack(files: &'static [&'static str]) -> impl Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync {
    move |spec: &CommandSpec| {
        let target = extraction_target(spec);
        for file in files {
            write_file(&target.join(file));
        }
        Ok(CommandOutput::default())
    }
}

/// A step that fails the way a process exiting with `code` does.
pub fn exit_with(code: i32) -> impl Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync {
    move |spec: &CommandSpec| {
        Err(Error::ProcessFailure {
            command: spec.to_string(),
            exit_code: Some(code),
            stderr: "scripted failure".to_string(),
        })
    }
}

pub fn succeed() -> impl Fn(&CommandSpec) -> Result<CommandOutput> + Send + Sync {
    |_: &CommandSpec| Ok(CommandOutput::default())
}

pub fn write_file(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    if path.ends_with("bin/control") {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// Serves downloads from a local archive and runs everything else for real.
pub struct LocalCurl {
    pub archive: PathBuf,
}

impl CommandRunner for LocalCurl {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if spec.program_name() == "curl" {
            fs::copy(&self.archive, arg_after(spec, "--output")).unwrap();
            return Ok(CommandOutput::default());
        }
        SystemRunner.run(spec)
    }
}
