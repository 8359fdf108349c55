//! Bin stub publication: wrapper scripts and version-arbitrated symlinks.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use rox_version::{Requirement, Version};

use crate::gemspec::Gemspec;
use crate::home::GemHome;
use crate::output::InstallOutput;
use crate::{InstallError, Result};

/// How executables are published into the shared bin directory.
#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Generate wrapper scripts instead of symlinks
    pub wrappers: bool,
    /// Interpreter referenced by wrapper shebangs
    pub interpreter: PathBuf,
    /// Whether the platform can create symlinks at all
    pub symlinks_supported: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            wrappers: true,
            interpreter: PathBuf::from("ruby"),
            symlinks_supported: cfg!(unix),
        }
    }
}

/// Publishes a gem's executables as shared commands, resolving conflicts
/// between installed versions.
///
/// Wrapper stubs are rewritten unconditionally: their content dispatches
/// to the newest matching version at run time. Symlink stubs pin one
/// version and are only moved when the incoming version is at least the
/// version the existing link points at. A switch between stub kinds
/// ignores versions entirely.
pub struct BinStubInstaller {
    config: StubConfig,
}

impl BinStubInstaller {
    pub fn new(config: StubConfig) -> Self {
        Self { config }
    }

    /// Create or update the bin stub for every executable `spec` declares.
    pub fn generate_bin(
        &self,
        spec: &Gemspec,
        home: &GemHome,
        output: &mut dyn InstallOutput,
    ) -> Result<()> {
        if spec.executables.is_empty() {
            return Ok(());
        }

        let bin_dir = home.bin_dir();
        fs::create_dir_all(&bin_dir).map_err(|e| Self::writable_error(e.into(), &bin_dir))?;

        for executable in &spec.executables {
            let result = if self.config.wrappers {
                self.generate_bin_script(spec, executable, &bin_dir)
            } else {
                self.generate_bin_symlink(spec, executable, &bin_dir, home, output)
            };
            result.map_err(|e| Self::writable_error(e, &bin_dir))?;
        }

        Ok(())
    }

    fn generate_bin_script(&self, spec: &Gemspec, executable: &str, bin_dir: &Path) -> Result<()> {
        let bin_path = bin_dir.join(executable);

        // writing through an existing symlink would follow it to the target
        if bin_path.symlink_metadata().is_ok() {
            fs::remove_file(&bin_path)?;
        }

        fs::write(
            &bin_path,
            wrapper_script(&spec.name, executable, &self.config.interpreter),
        )?;
        Self::make_executable(&bin_path)?;

        debug!("generated wrapper {}", bin_path.display());
        Ok(())
    }

    fn generate_bin_symlink(
        &self,
        spec: &Gemspec,
        executable: &str,
        bin_dir: &Path,
        home: &GemHome,
        output: &mut dyn InstallOutput,
    ) -> Result<()> {
        if !self.config.symlinks_supported {
            output.warn("Unable to use symlinks on this platform, installing wrapper");
            return self.generate_bin_script(spec, executable, bin_dir);
        }

        let source = home.package_dir(spec).join("bin").join(executable);
        let link = bin_dir.join(executable);

        match fs::read_link(&link) {
            Ok(existing) => {
                if let Some(existing_version) = version_from_target(&existing) {
                    if existing_version > spec.version {
                        debug!(
                            "keeping {} -> {}, newer than {}",
                            link.display(),
                            existing.display(),
                            spec.version
                        );
                        return Ok(());
                    }
                } else {
                    debug!("replacing unversioned stub target {}", existing.display());
                }
                fs::remove_file(&link)?;
            }
            // a wrapper script from a previous install; the kind switch wins
            Err(e) if e.kind() == ErrorKind::InvalidInput => {
                fs::remove_file(&link)?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        symlink_file(&source, &link)?;
        debug!("linked {} -> {}", link.display(), source.display());
        Ok(())
    }

    /// Bin-dir write failures surface as a permission error naming the
    /// directory.
    fn writable_error(error: InstallError, bin_dir: &Path) -> InstallError {
        match error {
            InstallError::Io(io) if io.kind() == ErrorKind::PermissionDenied => {
                InstallError::FilePermission {
                    path: bin_dir.to_path_buf(),
                }
            }
            other => other,
        }
    }

    #[cfg(unix)]
    fn make_executable(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn make_executable(_path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Wrapper script body: a pure function of gem name, command name, and
/// interpreter path. The generated script re-resolves the gem version at
/// run time, so one wrapper serves every installed version.
pub fn wrapper_script(gem_name: &str, executable: &str, interpreter: &Path) -> String {
    format!(
        r#"#!{shebang}
#
# This file was generated by rox.
#
# The application '{gem_name}' is installed as part of a gem, and
# this file is here to facilitate running it.
#

require 'rubygems'

version = "{default_requirement}"

if ARGV.first =~ /^_(.*)_$/ and Gem::Version.correct? $1 then
  version = $1
  ARGV.shift
end

gem '{gem_name}', version
load Gem.bin_path('{gem_name}', '{executable}', version)
"#,
        shebang = interpreter.display(),
        default_requirement = Requirement::default(),
    )
}

/// Parse the version baked into a symlink target's
/// `<name>-<version>/bin/<executable>` layout.
fn version_from_target(target: &Path) -> Option<Version> {
    let package_component = target.parent()?.parent()?.file_name()?.to_str()?;
    let (_, version) = package_component.rsplit_once('-')?;
    Version::parse(version).ok()
}

#[cfg(unix)]
fn symlink_file(source: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(source, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn symlink_file(_source: &Path, _link: &Path) -> Result<()> {
    Err(InstallError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryOutput;
    use tempfile::TempDir;

    fn quick_gem(version: &str) -> Gemspec {
        let mut spec = Gemspec::new("a", Version::parse(version).unwrap());
        spec.executables = vec!["my_exec".to_string()];
        spec
    }

    fn write_gem_executable(home: &GemHome, spec: &Gemspec) {
        let bin = home.package_dir(spec).join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("my_exec"), "#!/usr/bin/env ruby\n").unwrap();
    }

    fn wrapper_installer() -> BinStubInstaller {
        BinStubInstaller::new(StubConfig {
            wrappers: true,
            ..StubConfig::default()
        })
    }

    fn symlink_installer() -> BinStubInstaller {
        BinStubInstaller::new(StubConfig {
            wrappers: false,
            interpreter: PathBuf::from("/usr/bin/ruby"),
            symlinks_supported: true,
        })
    }

    #[test]
    fn test_wrapper_script_created() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let spec = quick_gem("0.0.2");
        let mut output = MemoryOutput::new();

        wrapper_installer().generate_bin(&spec, &home, &mut output).unwrap();

        let stub = home.bin_dir().join("my_exec");
        let content = fs::read_to_string(&stub).unwrap();
        assert!(content.contains("generated by rox"));
        assert!(content.contains("gem 'a', version"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&stub).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_wrapper_shebang_uses_configured_interpreter() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let spec = quick_gem("0.0.2");
        let installer = BinStubInstaller::new(StubConfig {
            wrappers: true,
            interpreter: PathBuf::from("/opt/ruby/bin/ruby"),
            symlinks_supported: true,
        });
        let mut output = MemoryOutput::new();

        installer.generate_bin(&spec, &home, &mut output).unwrap();

        let content = fs::read_to_string(home.bin_dir().join("my_exec")).unwrap();
        assert!(content.starts_with("#!/opt/ruby/bin/ruby\n"));
    }

    #[test]
    fn test_no_executables_creates_no_bin_dir() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let spec = Gemspec::new("a", Version::parse("0.0.2").unwrap());
        let mut output = MemoryOutput::new();

        wrapper_installer().generate_bin(&spec, &home, &mut output).unwrap();

        assert!(!home.bin_dir().exists());
    }

    #[test]
    fn test_wrapper_overwrites_existing_stub() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let mut output = MemoryOutput::new();

        fs::create_dir_all(home.bin_dir()).unwrap();
        fs::write(home.bin_dir().join("my_exec"), "leftover junk").unwrap();

        wrapper_installer()
            .generate_bin(&quick_gem("0.0.2"), &home, &mut output)
            .unwrap();

        let content = fs::read_to_string(home.bin_dir().join("my_exec")).unwrap();
        assert!(content.contains("generated by rox"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_bin_dir_reports_permission_error() {
        // chmod has no effect on root
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let mut output = MemoryOutput::new();

        fs::create_dir_all(home.bin_dir()).unwrap();
        fs::write(home.bin_dir().join("my_exec"), "previous stub").unwrap();
        fs::set_permissions(home.bin_dir(), fs::Permissions::from_mode(0o555)).unwrap();

        let err = wrapper_installer()
            .generate_bin(&quick_gem("0.0.2"), &home, &mut output)
            .unwrap_err();

        fs::set_permissions(home.bin_dir(), fs::Permissions::from_mode(0o755)).unwrap();

        match err {
            InstallError::FilePermission { path } => assert_eq!(path, home.bin_dir()),
            other => panic!("unexpected error: {other}"),
        }
        let existing = fs::read_to_string(home.bin_dir().join("my_exec")).unwrap();
        assert_eq!(existing, "previous stub");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_created() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let spec = quick_gem("0.0.2");
        let mut output = MemoryOutput::new();
        write_gem_executable(&home, &spec);

        symlink_installer().generate_bin(&spec, &home, &mut output).unwrap();

        let link = home.bin_dir().join("my_exec");
        let target = fs::read_link(&link).unwrap();
        assert_eq!(target, home.package_dir(&spec).join("bin/my_exec"));
        assert!(output.warned().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_moves_to_newer_version() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let mut output = MemoryOutput::new();
        let installer = symlink_installer();

        let older = quick_gem("0.0.2");
        let newer = quick_gem("0.0.3");
        write_gem_executable(&home, &older);
        write_gem_executable(&home, &newer);

        installer.generate_bin(&older, &home, &mut output).unwrap();
        installer.generate_bin(&newer, &home, &mut output).unwrap();

        let target = fs::read_link(home.bin_dir().join("my_exec")).unwrap();
        assert_eq!(target, home.package_dir(&newer).join("bin/my_exec"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_keeps_newer_version() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let mut output = MemoryOutput::new();
        let installer = symlink_installer();

        let older = quick_gem("0.0.2");
        let newer = quick_gem("0.0.3");
        write_gem_executable(&home, &older);
        write_gem_executable(&home, &newer);

        installer.generate_bin(&newer, &home, &mut output).unwrap();
        installer.generate_bin(&older, &home, &mut output).unwrap();

        let target = fs::read_link(home.bin_dir().join("my_exec")).unwrap();
        assert_eq!(target, home.package_dir(&newer).join("bin/my_exec"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_replaces_wrapper_on_mode_switch() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let spec = quick_gem("0.0.2");
        let mut output = MemoryOutput::new();
        write_gem_executable(&home, &spec);

        wrapper_installer().generate_bin(&spec, &home, &mut output).unwrap();
        symlink_installer().generate_bin(&spec, &home, &mut output).unwrap();

        let link = home.bin_dir().join("my_exec");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn test_wrapper_replaces_symlink_regardless_of_version() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let mut output = MemoryOutput::new();

        let newer = quick_gem("9.9.9");
        let older = quick_gem("0.0.1");
        write_gem_executable(&home, &newer);
        write_gem_executable(&home, &older);

        symlink_installer().generate_bin(&newer, &home, &mut output).unwrap();
        wrapper_installer().generate_bin(&older, &home, &mut output).unwrap();

        let link = home.bin_dir().join("my_exec");
        assert!(!fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert!(fs::read_to_string(&link).unwrap().contains("generated by rox"));
    }

    #[test]
    fn test_symlink_fallback_warns_and_installs_wrapper() {
        let temp = TempDir::new().unwrap();
        let home = GemHome::new(temp.path());
        let spec = quick_gem("0.0.2");
        let mut output = MemoryOutput::new();
        let installer = BinStubInstaller::new(StubConfig {
            wrappers: false,
            interpreter: PathBuf::from("ruby"),
            symlinks_supported: false,
        });

        installer.generate_bin(&spec, &home, &mut output).unwrap();

        let stub = home.bin_dir().join("my_exec");
        assert!(!fs::symlink_metadata(&stub).unwrap().file_type().is_symlink());
        assert!(fs::read_to_string(&stub).unwrap().contains("generated by rox"));
        assert_eq!(
            output.warned(),
            ["Unable to use symlinks on this platform, installing wrapper"]
        );
    }

    #[test]
    fn test_version_from_target() {
        let version = version_from_target(Path::new("/gems/my_gem-0.0.2/bin/my_exec"));
        assert_eq!(version, Some(Version::parse("0.0.2").unwrap()));

        let hyphenated = version_from_target(Path::new("/gems/my-gem-1.2/bin/x"));
        assert_eq!(hyphenated, Some(Version::parse("1.2").unwrap()));

        assert_eq!(version_from_target(Path::new("/gems/noversion/bin/x")), None);
        assert_eq!(version_from_target(Path::new("x")), None);
    }

    #[test]
    fn test_wrapper_script_is_deterministic() {
        let first = wrapper_script("a", "my_exec", Path::new("/usr/bin/ruby"));
        let second = wrapper_script("a", "my_exec", Path::new("/usr/bin/ruby"));
        assert_eq!(first, second);
        assert!(first.starts_with("#!/usr/bin/ruby\n"));
        assert!(first.contains("version = \">= 0\""));
        assert!(first.contains("load Gem.bin_path('a', 'my_exec', version)"));
    }
}
