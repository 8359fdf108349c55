//! Native extension builds.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::gemspec::Gemspec;
use crate::output::InstallOutput;
use crate::{InstallError, Result};

use super::build_log::{BuildLog, DEFAULT_BUILD_LOG};

/// Tool paths and log placement for extension builds.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Interpreter used to run extconf-style build scripts
    pub interpreter: PathBuf,
    /// Program invoked for make-based builds
    pub make_program: PathBuf,
    /// Program invoked for rakefile-based builds
    pub rake_program: PathBuf,
    /// Build log location
    pub build_log: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("ruby"),
            make_program: PathBuf::from("make"),
            rake_program: PathBuf::from("rake"),
            build_log: PathBuf::from(DEFAULT_BUILD_LOG),
        }
    }
}

/// Build strategy, chosen from the declared build file's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderKind {
    /// extconf-style script: run the interpreter on it, then make and
    /// make install
    ExtConf,
    /// configure script: run it with a prefix, then make and make install
    Configure,
    /// Rakefile or mkrf_conf script: run the rake program
    Rake,
}

impl BuilderKind {
    /// Detect the strategy by substring of the extension file name, the
    /// way gems declare it.
    pub fn for_extension(extension: &str) -> Option<Self> {
        let lower = extension.to_lowercase();

        if extension.contains("extconf") {
            Some(BuilderKind::ExtConf)
        } else if extension.contains("configure") {
            Some(BuilderKind::Configure)
        } else if lower.contains("rakefile") || lower.contains("mkrf_conf") {
            Some(BuilderKind::Rake)
        } else {
            None
        }
    }
}

/// Runs the native build tools a gem declares, funneling all of their
/// output into the build log.
pub struct ExtensionBuilder {
    config: BuildConfig,
}

impl ExtensionBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Build every extension `spec` declares inside `package_dir`.
    ///
    /// A one-time notice is emitted before the first build. The first
    /// failing extension aborts the rest; its output is already in the
    /// build log by then. Tool output never reaches `output`.
    pub fn build_extensions(
        &self,
        package_dir: &Path,
        spec: &Gemspec,
        output: &mut dyn InstallOutput,
    ) -> Result<()> {
        if spec.extensions.is_empty() {
            return Ok(());
        }

        output.say("Building native extensions.  This could take a while...");
        let log = BuildLog::new(&self.config.build_log);

        for extension in &spec.extensions {
            self.build_extension(package_dir, extension, &log)?;
        }

        Ok(())
    }

    fn build_extension(&self, package_dir: &Path, extension: &str, log: &BuildLog) -> Result<()> {
        let Some(kind) = BuilderKind::for_extension(extension) else {
            log.append(&format!("No builder for extension '{extension}'\n"))?;
            return Err(InstallError::UnsupportedExtension {
                extension: extension.to_string(),
            });
        };

        debug!("building extension {extension} with {kind:?}");

        // build scripts run from the directory they live in, by basename
        let workdir = extension_workdir(package_dir, extension);
        let script = Path::new(extension)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| extension.to_string());

        for mut command in self.commands_for(kind, package_dir, &workdir, &script) {
            self.run(command.current_dir(&workdir), log)?;
        }

        Ok(())
    }

    /// The command sequence for one extension, in run order.
    fn commands_for(
        &self,
        kind: BuilderKind,
        package_dir: &Path,
        workdir: &Path,
        script: &str,
    ) -> Vec<Command> {
        let dest = package_dir.join("lib");

        match kind {
            BuilderKind::ExtConf => {
                let mut configure = Command::new(&self.config.interpreter);
                configure.arg(script);

                let mut commands = vec![configure];
                commands.extend(self.make_commands());
                commands
            }
            BuilderKind::Configure => {
                let mut commands = Vec::new();
                // an existing Makefile means configure already ran
                if !workdir.join("Makefile").exists() {
                    let mut configure = Command::new("sh");
                    configure
                        .arg(script)
                        .arg(format!("--prefix={}", dest.display()));
                    commands.push(configure);
                }
                commands.extend(self.make_commands());
                commands
            }
            BuilderKind::Rake => {
                let mut commands = Vec::new();
                if script.to_lowercase().contains("mkrf_conf") {
                    let mut configure = Command::new(&self.config.interpreter);
                    configure.arg(script);
                    commands.push(configure);
                }

                let mut rake = Command::new(&self.config.rake_program);
                rake.arg(format!("RUBYARCHDIR={}", dest.display()))
                    .arg(format!("RUBYLIBDIR={}", dest.display()));
                commands.push(rake);
                commands
            }
        }
    }

    fn make_commands(&self) -> Vec<Command> {
        let make = Command::new(&self.config.make_program);
        let mut install = Command::new(&self.config.make_program);
        install.arg("install");
        vec![make, install]
    }

    /// Run one command, teeing its command line and combined output into
    /// the log.
    fn run(&self, command: &mut Command, log: &BuildLog) -> Result<()> {
        log.append(&format!("{}\n", render_command(command)))?;

        match command.output() {
            Ok(output) => {
                log.append(&String::from_utf8_lossy(&output.stdout))?;
                log.append(&String::from_utf8_lossy(&output.stderr))?;

                if output.status.success() {
                    Ok(())
                } else {
                    Err(InstallError::ExtensionBuild {
                        log: log.path().to_path_buf(),
                    })
                }
            }
            Err(e) => {
                log.append(&format!("{e}\n"))?;
                Err(InstallError::ExtensionBuild {
                    log: log.path().to_path_buf(),
                })
            }
        }
    }
}

fn extension_workdir(package_dir: &Path, extension: &str) -> PathBuf {
    match Path::new(extension).parent() {
        Some(parent) if parent != Path::new("") => package_dir.join(parent),
        _ => package_dir.to_path_buf(),
    }
}

fn render_command(command: &Command) -> String {
    let mut line = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}
