use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::schema::{ai_model::AiModel, training_state::TrainingState};

/// Destination for JSON documents: stdout or a buffered file.
#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Writes `value` to `output_path`, or to stdout when there is none.
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = match output_path {
            Some(path) => Output::create(path)?,
            None => Output::stdout(),
        };
        output.write_json(value)
    }

    /// Writes `value` next to `path` and then renames it into place, so an
    /// interrupted write never leaves a truncated file behind.
    pub fn replace_json<T>(value: &T, path: &Path) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        Output::create(tmp_path.clone())?.write_json(value)?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to move {} to {}",
                tmp_path.display(),
                path.display()
            )
        })
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn create(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_owned(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    /// Writes pretty-printed JSON followed by a newline and flushes.
    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .and_then(|()| writeln!(self).map_err(serde_json::Error::io))
            .and_then(|()| self.flush().map_err(serde_json::Error::io))
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read a trained model from a JSON file
pub fn read_ai_model_file<P>(path: P) -> anyhow::Result<AiModel>
where
    P: AsRef<Path>,
{
    read_json_file("AI model", path)
}

/// Read saved training state from a JSON file
pub fn read_training_state_file<P>(path: P) -> anyhow::Result<TrainingState>
where
    P: AsRef<Path>,
{
    read_json_file("training state", path)
}

/// Creates the random number generator for a command.
///
/// A fixed `seed` makes runs reproducible; otherwise the generator is seeded
/// from the thread-local generator.
pub fn make_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    }
}
