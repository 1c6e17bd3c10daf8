//! Transfer benchmark configuration.
//!
//! The transfer probes take optional positional arguments
//! (`width height all` or `width height count all`). Either all of them are
//! given or none; anything else is a usage error.

use crate::error::ProbeError;

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_ITERATIONS: u32 = 100;

/// Bytes per texel of every texture the probes create.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Largest texture edge a feature level 11 device accepts.
pub const MAX_DIMENSION: u32 = 16384;

/// Texture size in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one tightly packed row.
    pub fn row_pitch(&self) -> u32 {
        self.width * BYTES_PER_PIXEL
    }

    /// Bytes in the tightly packed image.
    pub fn byte_len(&self) -> usize {
        self.row_pitch() as usize * self.height as usize
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which transfer probe the arguments are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// One pass per adapter with per-call timings.
    Single,
    /// `count` passes per adapter with averaged timings.
    Repeated,
}

impl Variant {
    /// Number of positionals the variant accepts besides zero.
    pub fn positional_count(self) -> usize {
        match self {
            Variant::Single => 3,
            Variant::Repeated => 4,
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            Variant::Single => "transfer",
            Variant::Repeated => "bench",
        }
    }

    /// Usage text printed when the positionals are rejected.
    pub fn usage(self) -> String {
        let cmd = self.command();
        match self {
            Variant::Single => format!(
                "usage: dxprobe {cmd} <w> <h> <all>\n\
                 eg: dxprobe {cmd} 1920 1080 false\n\
                 default: w={DEFAULT_WIDTH}, h={DEFAULT_HEIGHT} all=true"
            ),
            Variant::Repeated => format!(
                "usage: dxprobe {cmd} <w> <h> <count> <all>\n\
                 eg: dxprobe {cmd} 1920 1080 10 false\n\
                 default: w={DEFAULT_WIDTH}, h={DEFAULT_HEIGHT} count={DEFAULT_ITERATIONS} all=true"
            ),
        }
    }
}

/// Configuration for a transfer probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Size of the benchmarked texture.
    pub extent: Extent,
    /// Passes per adapter (ignored by the single-pass probe).
    pub iterations: u32,
    /// Run on every enumerated adapter instead of the default one.
    pub all_adapters: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            extent: Extent::default(),
            iterations: DEFAULT_ITERATIONS,
            all_adapters: true,
        }
    }
}

impl TransferConfig {
    /// Builds a configuration from the positional arguments of `variant`.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Usage` for a wrong argument count or a
    /// width/height/count that is not a positive integer.
    pub fn from_positional(args: &[String], variant: Variant) -> Result<Self, ProbeError> {
        if args.is_empty() {
            return Ok(Self::default());
        }
        if args.len() != variant.positional_count() {
            return Err(ProbeError::Usage(format!(
                "expected 0 or {} arguments, got {}",
                variant.positional_count(),
                args.len()
            )));
        }

        let width = parse_dimension("width", &args[0])?;
        let height = parse_dimension("height", &args[1])?;
        let (iterations, all) = match variant {
            Variant::Single => (DEFAULT_ITERATIONS, &args[2]),
            Variant::Repeated => (parse_positive("count", &args[2])?, &args[3]),
        };

        Ok(Self {
            extent: Extent::new(width, height),
            iterations,
            all_adapters: all == "true",
        })
    }
}

fn parse_positive(name: &str, value: &str) -> Result<u32, ProbeError> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ProbeError::Usage(format!(
            "{name} must be a positive integer, got {value:?}"
        ))),
    }
}

fn parse_dimension(name: &str, value: &str) -> Result<u32, ProbeError> {
    let n = parse_positive(name, value)?;
    if n > MAX_DIMENSION {
        return Err(ProbeError::Usage(format!(
            "{name} must be at most {MAX_DIMENSION}, got {n}"
        )));
    }
    Ok(n)
}
