//! Transcoding job descriptions and their ffmpeg argument vectors.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::filters::EffectChain;

/// Frame rate of the composed still-image video.
pub const VIDEO_FRAME_RATE: u32 = 5;
pub const VIDEO_CODEC: &str = "libx264";
pub const VIDEO_PIXEL_FORMAT: &str = "yuv420p";
pub const VIDEO_SCALE_FILTER: &str = "scale=720:-2";
pub const VIDEO_PRESET: &str = "ultrafast";
pub const VIDEO_TUNE: &str = "stillimage";
pub const VIDEO_CRF: u32 = 30;
pub const VIDEO_AUDIO_CODEC: &str = "aac";
pub const VIDEO_AUDIO_BITRATE: &str = "96k";
pub const VIDEO_AUDIO_SAMPLE_RATE: u32 = 22050;
pub const VIDEO_AUDIO_CHANNELS: u32 = 2;

pub const AUDIO_CODEC: &str = "libmp3lame";
pub const AUDIO_BITRATE: &str = "128k";
pub const AUDIO_CHANNELS: u32 = 1;
pub const AUDIO_FORMAT: &str = "mp3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// Loop a still image for the length of an audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionSpec {
    pub image: PathBuf,
    pub audio: PathBuf,
    /// Duration as reported by the probe, passed through untouched.
    pub duration: String,
}

#[derive(Debug, Clone)]
pub enum JobSpec<'a> {
    Filter { input: PathBuf, chain: &'a EffectChain },
    Compose(CompositionSpec),
}

/// One invocation of the transcoding engine.
#[derive(Debug, Clone)]
pub struct TranscodeJob<'a> {
    pub spec: JobSpec<'a>,
    pub output: PathBuf,
}

impl<'a> TranscodeJob<'a> {
    pub fn filter_audio(input: &Path, output: &Path, chain: &'a EffectChain) -> Self {
        Self {
            spec: JobSpec::Filter {
                input: input.to_path_buf(),
                chain,
            },
            output: output.to_path_buf(),
        }
    }

    pub fn compose_video(spec: CompositionSpec, output: &Path) -> Self {
        Self {
            spec: JobSpec::Compose(spec),
            output: output.to_path_buf(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self.spec {
            JobSpec::Filter { .. } => MediaKind::Audio,
            JobSpec::Compose(_) => MediaKind::Video,
        }
    }

    /// Full argument vector for the engine. Deterministic for a given job.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        match &self.spec {
            JobSpec::Filter { input, chain } => {
                args.push("-i".into());
                args.push(input.as_os_str().to_owned());
                extend(
                    &mut args,
                    &[
                        "-af",
                        &chain.to_filter_graph(),
                        "-c:a",
                        AUDIO_CODEC,
                        "-b:a",
                        AUDIO_BITRATE,
                        "-ac",
                        &AUDIO_CHANNELS.to_string(),
                        "-f",
                        AUDIO_FORMAT,
                    ],
                );
            }
            JobSpec::Compose(c) => {
                let fps = VIDEO_FRAME_RATE.to_string();
                extend(
                    &mut args,
                    &["-loop", "1", "-framerate", &fps, "-t", &c.duration, "-i"],
                );
                args.push(c.image.as_os_str().to_owned());
                args.push("-i".into());
                args.push(c.audio.as_os_str().to_owned());
                extend(
                    &mut args,
                    &[
                        "-c:v",
                        VIDEO_CODEC,
                        "-c:a",
                        VIDEO_AUDIO_CODEC,
                        "-pix_fmt",
                        VIDEO_PIXEL_FORMAT,
                        "-vf",
                        VIDEO_SCALE_FILTER,
                        "-r",
                        &fps,
                        "-preset",
                        VIDEO_PRESET,
                        "-tune",
                        VIDEO_TUNE,
                        "-crf",
                        &VIDEO_CRF.to_string(),
                        "-b:a",
                        VIDEO_AUDIO_BITRATE,
                        "-ar",
                        &VIDEO_AUDIO_SAMPLE_RATE.to_string(),
                        "-ac",
                        &VIDEO_AUDIO_CHANNELS.to_string(),
                    ],
                );
            }
        }

        // Always overwrite.
        args.push("-y".into());
        args.push(self.output.as_os_str().to_owned());
        args
    }
}

fn extend(args: &mut Vec<OsString>, values: &[&str]) {
    args.extend(values.iter().map(OsString::from));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcode::filters::FilterCatalog;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn audio_job_args_match_engine_contract() {
        let chain = FilterCatalog::global().resolve("2").unwrap();
        let job = TranscodeJob::filter_audio(
            Path::new("/tmp/input_a.mp3"),
            Path::new("/tmp/output_a.mp3"),
            chain,
        );

        let args = as_strings(&job.args());
        assert_eq!(
            args,
            vec![
                "-i".to_string(),
                "/tmp/input_a.mp3".to_string(),
                "-af".to_string(),
                chain.to_filter_graph(),
                "-c:a".to_string(),
                "libmp3lame".to_string(),
                "-b:a".to_string(),
                "128k".to_string(),
                "-ac".to_string(),
                "1".to_string(),
                "-f".to_string(),
                "mp3".to_string(),
                "-y".to_string(),
                "/tmp/output_a.mp3".to_string(),
            ]
        );
        assert_eq!(job.kind(), MediaKind::Audio);
    }

    #[test]
    fn audio_job_args_are_deterministic() {
        let build = || {
            let chain = FilterCatalog::global().resolve("4").unwrap();
            TranscodeJob::filter_audio(Path::new("/in.mp3"), Path::new("/out.mp3"), chain).args()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn video_job_loops_image_at_low_frame_rate() {
        let job = TranscodeJob::compose_video(
            CompositionSpec {
                image: PathBuf::from("/srv/bg.jpg"),
                audio: PathBuf::from("/tmp/audio_x.mp3"),
                duration: "12.5".to_string(),
            },
            Path::new("/tmp/video_x.mp4"),
        );

        let args = as_strings(&job.args());
        assert_eq!(flag_value(&args, "-loop"), Some("1"));
        assert_eq!(flag_value(&args, "-framerate"), Some("5"));
        assert_eq!(flag_value(&args, "-t"), Some("12.5"));
        assert_eq!(flag_value(&args, "-r"), Some("5"));
        assert_eq!(flag_value(&args, "-c:v"), Some("libx264"));
        assert_eq!(flag_value(&args, "-c:a"), Some("aac"));
        assert_eq!(flag_value(&args, "-pix_fmt"), Some("yuv420p"));
        assert_eq!(flag_value(&args, "-vf"), Some("scale=720:-2"));
        assert_eq!(flag_value(&args, "-preset"), Some("ultrafast"));
        assert_eq!(flag_value(&args, "-tune"), Some("stillimage"));
        assert_eq!(flag_value(&args, "-crf"), Some("30"));
        assert_eq!(flag_value(&args, "-b:a"), Some("96k"));
        assert_eq!(flag_value(&args, "-ar"), Some("22050"));
        assert_eq!(flag_value(&args, "-ac"), Some("2"));

        // Image input options must precede the image input itself.
        let image_pos = args.iter().position(|a| a == "/srv/bg.jpg").unwrap();
        let loop_pos = args.iter().position(|a| a == "-loop").unwrap();
        assert!(loop_pos < image_pos);
        assert_eq!(args[image_pos + 1], "-i");
        assert_eq!(args[image_pos + 2], "/tmp/audio_x.mp3");
        assert_eq!(args[args.len() - 2], "-y");
        assert_eq!(args.last().unwrap(), "/tmp/video_x.mp4");
        assert_eq!(job.kind(), MediaKind::Video);
    }
}
