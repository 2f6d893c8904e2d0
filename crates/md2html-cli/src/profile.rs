use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, debug_span, warn};

/// Samples per second while a CPU profile is being recorded.
const SAMPLE_FREQUENCY: i32 = 100;

/// CPU profile covering the rest of the run. The pprof protobuf is written
/// to the target file when the profiler drops.
pub struct Profiler {
    session: Option<Session>,
}

struct Session {
    path: PathBuf,
    file: File,
    sampler: sampler::Sampler,
}

impl Profiler {
    /// Create the profile file and start sampling. A file that cannot be
    /// created, or a sampler that cannot start, is reported and profiling is
    /// skipped; the run itself carries on.
    pub fn start(path: Option<&Path>) -> Self {
        let session = path.and_then(|path| {
            let file = match File::create(path) {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("md2html: error creating profile {}: {err}", path.display());
                    return None;
                }
            };
            match sampler::Sampler::start() {
                Ok(sampler) => Some(Session {
                    path: path.to_path_buf(),
                    file,
                    sampler,
                }),
                Err(err) => {
                    eprintln!("md2html: could not start cpu profile: {err:#}");
                    None
                }
            }
        });

        Self { session }
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    fn finish(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        session.sampler.write_to(session.file, &session.path)?;
        debug!(path = %session.path.display(), "wrote cpu profile");
        Ok(())
    }
}

impl Drop for Profiler {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            warn!("{err:#}");
        }
    }
}

/// Run `phase` inside a `phase` span and log how long it took.
pub fn timed<T>(name: &'static str, phase: impl FnOnce() -> T) -> T {
    let span = debug_span!("phase", name);
    let _entered = span.enter();
    let started = Instant::now();
    let value = phase();
    debug!(
        micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        "phase finished"
    );
    value
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
mod sampler {
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::Path;

    use anyhow::{Context, Result};
    use pprof::protos::Message;
    use pprof::{ProfilerGuard, ProfilerGuardBuilder};

    use super::SAMPLE_FREQUENCY;

    pub struct Sampler {
        guard: ProfilerGuard<'static>,
    }

    impl Sampler {
        pub fn start() -> Result<Self> {
            let guard = ProfilerGuardBuilder::default()
                .frequency(SAMPLE_FREQUENCY)
                .blocklist(&["libc", "libgcc", "pthread", "vdso"])
                .build()
                .context("failed to start cpu sampler")?;
            Ok(Self { guard })
        }

        pub fn write_to(self, file: File, path: &Path) -> Result<()> {
            let profile = self
                .guard
                .report()
                .build()
                .and_then(|report| report.pprof())
                .with_context(|| format!("failed to build cpu profile for {}", path.display()))?;

            let mut encoded = Vec::new();
            profile
                .encode(&mut encoded)
                .with_context(|| format!("failed to encode cpu profile for {}", path.display()))?;

            let mut writer = BufWriter::new(file);
            writer
                .write_all(&encoded)
                .and_then(|_| writer.flush())
                .with_context(|| format!("failed to write cpu profile {}", path.display()))
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod sampler {
    use std::fs::File;
    use std::path::Path;

    use anyhow::{bail, Result};

    pub struct Sampler;

    impl Sampler {
        pub fn start() -> Result<Self> {
            bail!("cpu profiling is not supported on this platform")
        }

        pub fn write_to(self, _file: File, _path: &Path) -> Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn disabled_profiler_records_nothing() {
        let profiler = Profiler::start(None);
        assert!(!profiler.is_enabled());
        assert_eq!(timed("read", || 41 + 1), 42);
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn writes_pprof_profile_on_drop() {
        use pprof::protos::{Message, Profile};

        let dir = tempdir().unwrap();
        let path = dir.path().join("cpu.prof");

        {
            let profiler = Profiler::start(Some(&path));
            assert!(profiler.is_enabled());
            let sum: u64 = timed("convert", || (0..2_000_000u64).map(|n| n % 7).sum());
            assert!(sum > 0);
        }

        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.is_empty());
        let profile = Profile::decode(bytes.as_slice()).unwrap();
        assert!(!profile.sample_type.is_empty());
    }

    #[test]
    fn uncreatable_profile_is_skipped() {
        let dir = tempdir().unwrap();
        let profiler = Profiler::start(Some(&dir.path().join("missing/dir/cpu.prof")));
        assert!(!profiler.is_enabled());
    }
}
