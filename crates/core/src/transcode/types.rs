//! Types for the transcode module.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::process::PipelineStage;

const INPUT_PLACEHOLDERS: [&str; 2] = ["${input}", "$input"];
const OUTPUT_PLACEHOLDERS: [&str; 2] = ["${output}", "$output"];

/// How to turn one input file into one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOperation {
    /// A shell command template. It runs under `sh -c` with the environment
    /// variables `input` and `output` set to the two paths, so the template
    /// should reference them quoted: `"$input"`, `"$output"`.
    Command { template: String, extension: String },

    /// Decoder stdout streamed into encoder stdin.
    Pipeline {
        decode: StageTemplate,
        encode: StageTemplate,
        extension: String,
    },
}

impl TranscodeOperation {
    pub fn command(template: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::Command {
            template: template.into(),
            extension: normalize_extension(extension.into()),
        }
    }

    pub fn pipeline(
        decode: StageTemplate,
        encode: StageTemplate,
        extension: impl Into<String>,
    ) -> Self {
        Self::Pipeline {
            decode,
            encode,
            extension: normalize_extension(extension.into()),
        }
    }

    /// The shell template of a [`TranscodeOperation::Command`].
    pub fn command_template(&self) -> Option<&str> {
        match self {
            Self::Command { template, .. } => Some(template),
            Self::Pipeline { .. } => None,
        }
    }

    /// The two stages of a [`TranscodeOperation::Pipeline`].
    pub fn stages(&self) -> Option<(&StageTemplate, &StageTemplate)> {
        match self {
            Self::Pipeline { decode, encode, .. } => Some((decode, encode)),
            Self::Command { .. } => None,
        }
    }

    /// Output file extension, without the leading dot.
    pub fn extension(&self) -> &str {
        match self {
            Self::Command { extension, .. } | Self::Pipeline { extension, .. } => extension,
        }
    }

    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Command { template, .. } => format!("sh -c {}", template),
            Self::Pipeline { decode, encode, .. } => {
                format!("{} | {}", decode.render(), encode.render())
            }
        }
    }
}

fn normalize_extension(extension: String) -> String {
    match extension.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => extension,
    }
}

/// A pipeline stage whose arguments may contain `$input` / `$output`
/// placeholders (also accepted as `${input}` / `${output}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTemplate {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl StageTemplate {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Substitutes the placeholders, producing a runnable stage.
    ///
    /// An argument that is exactly a placeholder receives the path unchanged
    /// (non-UTF-8 paths included). Placeholders embedded in a longer argument
    /// are replaced textually.
    pub fn bind(&self, input: &Path, output: &Path) -> PipelineStage {
        let args = self
            .args
            .iter()
            .map(|arg| bind_arg(arg, input, output))
            .collect::<Vec<_>>();
        PipelineStage::new(&self.program, args)
    }

    /// Whether any argument references `$output`.
    pub fn references_output(&self) -> bool {
        self.args
            .iter()
            .any(|a| OUTPUT_PLACEHOLDERS.iter().any(|p| a.contains(p)))
    }

    fn render(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

fn bind_arg(arg: &str, input: &Path, output: &Path) -> OsString {
    if INPUT_PLACEHOLDERS.contains(&arg) {
        return input.as_os_str().to_os_string();
    }
    if OUTPUT_PLACEHOLDERS.contains(&arg) {
        return output.as_os_str().to_os_string();
    }

    let mut bound = arg.to_string();
    // Braced forms first so "${input}" is not left as "{...}".
    for placeholder in INPUT_PLACEHOLDERS {
        bound = bound.replace(placeholder, &input.to_string_lossy());
    }
    for placeholder in OUTPUT_PLACEHOLDERS {
        bound = bound.replace(placeholder, &output.to_string_lossy());
    }
    OsString::from(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_whole_argument_placeholders() {
        let stage = StageTemplate::new("fdkaac", ["-I", "-", "-o", "$output"]);
        let bound = stage.bind(Path::new("/tmp/a.flac"), Path::new("/tmp/out/01 - A.m4a"));
        assert_eq!(bound.program, PathBuf::from("fdkaac"));
        assert_eq!(
            bound.args,
            vec![
                OsString::from("-I"),
                OsString::from("-"),
                OsString::from("-o"),
                OsString::from("/tmp/out/01 - A.m4a"),
            ]
        );
    }

    #[test]
    fn test_bind_embedded_and_braced_placeholders() {
        let stage = StageTemplate::new("enc", ["--in=${input}", "--out=$output", "${output}.log"]);
        let bound = stage.bind(Path::new("/in.flac"), Path::new("/out.m4a"));
        assert_eq!(
            bound.args,
            vec![
                OsString::from("--in=/in.flac"),
                OsString::from("--out=/out.m4a"),
                OsString::from("/out.m4a.log"),
            ]
        );
    }

    #[test]
    fn test_extension_is_normalized() {
        let op = TranscodeOperation::command("true", ".opus");
        assert_eq!(op.extension(), "opus");
        let op = TranscodeOperation::pipeline(
            StageTemplate::new("a", Vec::<String>::new()),
            StageTemplate::new("b", Vec::<String>::new()),
            "m4a",
        );
        assert_eq!(op.extension(), "m4a");
    }

    #[test]
    fn test_references_output() {
        assert!(StageTemplate::new("fdkaac", ["-o", "$output"]).references_output());
        assert!(StageTemplate::new("x", ["--out=${output}"]).references_output());
        assert!(!StageTemplate::new("ffmpeg", ["-i", "$input"]).references_output());
    }

    #[test]
    fn test_describe_pipeline() {
        let op = TranscodeOperation::pipeline(
            StageTemplate::new("ffmpeg", ["-i", "$input", "-f", "caf", "-"]),
            StageTemplate::new("fdkaac", ["-", "-o", "$output"]),
            "m4a",
        );
        assert_eq!(op.describe(), "ffmpeg -i $input -f caf - | fdkaac - -o $output");
    }
}
