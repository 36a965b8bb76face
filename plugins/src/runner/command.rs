use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use sweep_core::api::{ParameterPair, SolverConfig};
use tokio::process::Command;

/// Command line for one solver invocation: fixed flags, one override per
/// axis, then the model file.
#[derive(Debug, Clone)]
pub struct SolverCommand {
    pub bin: String,
    pub args: Vec<String>,
    pub define_flag: String,
    pub param_i: String,
    pub param_j: String,
    pub model: Option<String>,
    pub workdir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl SolverCommand {
    pub fn from_config(cfg: &SolverConfig) -> Self {
        Self {
            bin: cfg.bin.clone(),
            args: cfg.args.clone(),
            define_flag: cfg.define_flag.clone(),
            param_i: cfg.param_i.clone(),
            param_j: cfg.param_j.clone(),
            model: Some(cfg.model.clone()).filter(|m| !m.trim().is_empty()),
            workdir: cfg.workdir.as_ref().map(PathBuf::from),
            env: cfg.env.clone(),
        }
    }

    pub fn argv(&self, pair: ParameterPair) -> Vec<String> {
        let mut argv = self.args.clone();
        for (name, value) in [(&self.param_i, pair.i), (&self.param_j, pair.j)] {
            if !self.define_flag.is_empty() {
                argv.push(self.define_flag.clone());
            }
            argv.push(format!("{name}={value}"));
        }
        if let Some(model) = &self.model {
            argv.push(model.clone());
        }
        argv
    }

    pub fn describe(&self, pair: ParameterPair) -> String {
        std::iter::once(self.bin.clone())
            .chain(self.argv(pair))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn build(&self, pair: ParameterPair) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(self.argv(pair))
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}
