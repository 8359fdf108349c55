//! Install orchestration.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use rox_version::Version;

use crate::archive::{ArchiveExtractor, PackageArchive};
use crate::extension::{BuildConfig, ExtensionBuilder, DEFAULT_BUILD_LOG};
use crate::gemspec::Gemspec;
use crate::home::GemHome;
use crate::output::InstallOutput;
use crate::{InstallError, Result};

use super::binstub::{BinStubInstaller, StubConfig};

/// Flat configuration for an install run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Generate wrapper scripts instead of symlinks for bin stubs
    pub wrappers: bool,
    /// Skip the version requirement gates
    pub force: bool,
    /// Interpreter for wrapper shebangs and extconf-style build scripts
    pub interpreter: PathBuf,
    /// Program for make-based extension builds
    pub make_program: PathBuf,
    /// Program for rakefile-based extension builds
    pub rake_program: PathBuf,
    /// Extension build log location
    pub build_log: PathBuf,
    /// Whether the platform can create symlinks
    pub symlinks_supported: bool,
    /// Version of the Ruby interpreter gems will run under. When unset,
    /// gems' Ruby requirements are not enforced.
    pub ruby_version: Option<Version>,
    /// RubyGems version this tool advertises to requirement gates
    pub rubygems_version: Version,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            wrappers: true,
            force: false,
            interpreter: PathBuf::from("ruby"),
            make_program: PathBuf::from("make"),
            rake_program: PathBuf::from("rake"),
            build_log: PathBuf::from(DEFAULT_BUILD_LOG),
            symlinks_supported: cfg!(unix),
            ruby_version: None,
            rubygems_version: Version::parse(env!("CARGO_PKG_VERSION"))
                .unwrap_or_else(|_| Version::zero()),
        }
    }
}

/// Orchestrates one gem install: requirement gates, extraction, extension
/// builds, bin stubs, and the specifications record.
pub struct Installer {
    options: InstallOptions,
}

impl Installer {
    pub fn new(options: InstallOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    /// Install `spec`'s archive into `home`, returning the per-version
    /// gem directory.
    ///
    /// Steps run strictly in order and the first failure aborts the rest:
    /// requirement gates, extraction, extension builds, bin stubs, the
    /// specifications record, and finally the gem's post-install message.
    pub fn install(
        &self,
        spec: &Gemspec,
        archive: &mut dyn PackageArchive,
        home: &GemHome,
        output: &mut dyn InstallOutput,
    ) -> Result<PathBuf> {
        self.check_requirements(spec)?;

        let gem_dir = home.package_dir(spec);
        info!("installing {} into {}", spec.full_name(), gem_dir.display());

        ArchiveExtractor::extract_files(&gem_dir, archive)?;
        self.build_extensions(&gem_dir, spec, output)?;
        self.generate_bin(spec, home, output)?;
        self.write_spec(spec, home)?;

        if let Some(message) = &spec.post_install_message {
            output.say(message);
        }

        Ok(gem_dir)
    }

    /// Version gates run before any filesystem mutation; `force` skips
    /// them.
    fn check_requirements(&self, spec: &Gemspec) -> Result<()> {
        if self.options.force {
            return Ok(());
        }

        if let (Some(requirement), Some(ruby_version)) =
            (&spec.required_ruby_version, &self.options.ruby_version)
        {
            if !requirement.satisfied_by(ruby_version) {
                return Err(InstallError::RequirementUnmet {
                    package: spec.name.clone(),
                    tool: "Ruby".to_string(),
                    constraint: requirement.to_string(),
                });
            }
        }

        if let Some(requirement) = &spec.required_rubygems_version {
            if !requirement.satisfied_by(&self.options.rubygems_version) {
                return Err(InstallError::RequirementUnmet {
                    package: spec.name.clone(),
                    tool: "RubyGems".to_string(),
                    constraint: requirement.to_string(),
                });
            }
        }

        Ok(())
    }

    fn build_extensions(
        &self,
        gem_dir: &Path,
        spec: &Gemspec,
        output: &mut dyn InstallOutput,
    ) -> Result<()> {
        let builder = ExtensionBuilder::new(BuildConfig {
            interpreter: self.options.interpreter.clone(),
            make_program: self.options.make_program.clone(),
            rake_program: self.options.rake_program.clone(),
            build_log: self.options.build_log.clone(),
        });
        builder.build_extensions(gem_dir, spec, output)
    }

    fn generate_bin(
        &self,
        spec: &Gemspec,
        home: &GemHome,
        output: &mut dyn InstallOutput,
    ) -> Result<()> {
        let stubs = BinStubInstaller::new(StubConfig {
            wrappers: self.options.wrappers,
            interpreter: self.options.interpreter.clone(),
            symlinks_supported: self.options.symlinks_supported,
        });
        stubs.generate_bin(spec, home, output)
    }

    fn write_spec(&self, spec: &Gemspec, home: &GemHome) -> Result<()> {
        let dir = home.specifications_dir();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(spec.spec_file_name()), spec.to_json()?)?;
        Ok(())
    }
}
