use anyhow::{Result, Context};
use log::{error, warn, info, debug};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::media;
use crate::retiming::{self, RetimeOutcome};
use crate::session::SessionContext;
use crate::subtitle_processor::{SubtitleCollection, ParseWarning};
use crate::synthesis::{self, SpeechSynthesizer};
use crate::timeline::TimelineAssembler;
use crate::translation::TranslationService;

// @module: Application controller for the dubbing pipeline

/// End-of-run counters reported to the caller
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// Cues that entered the pipeline (after optional compression)
    pub cue_count: usize,

    /// Subtitle blocks skipped during parsing
    pub parse_warnings: usize,

    /// Cues that kept source-language text
    pub untranslated: usize,

    /// Cues replaced by exact-window silence
    pub silence_filled: usize,

    /// Cues whose raw clip was used because the tempo tool failed
    pub retime_fallbacks: usize,

    /// Cues skipped because a previous run already produced their clip
    pub resumed: usize,
}

/// Main application controller for video dubbing
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the whole dubbing pipeline for one video.
    ///
    /// Stages run strictly in order: parse, optional compression,
    /// translation, per-cue synthesis and retiming, timeline assembly,
    /// final mux. Per-cue failures degrade; only total parse failure and
    /// the final mux abort the run.
    pub async fn run(
        &self,
        input_video: PathBuf,
        subtitle: Option<PathBuf>,
        output_dir: PathBuf,
        source_url: Option<String>,
        resume: bool,
        force_overwrite: bool,
    ) -> Result<PathBuf> {
        let start_time = Instant::now();

        if !input_video.exists() {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", input_video));
        }
        FileManager::ensure_dir(&output_dir)?;

        // Normalize the target code when possible, but continue if not
        let target_language = match language_utils::normalize_language_code(&self.config.target_language) {
            Ok(code) => code,
            Err(e) => {
                warn!("Language code issue: {}", e);
                self.config.target_language.clone()
            }
        };

        let session_source = source_url.unwrap_or_else(|| input_video.to_string_lossy().to_string());
        let session = SessionContext::derive(&session_source, &output_dir, &target_language);
        info!("Session {} -> {:?}", session.id, session.working_dir);

        let output_path = session.output_video_path();
        if output_path.exists() && !force_overwrite {
            warn!("Skipping run, output already exists (use -f to force overwrite)");
            return Ok(output_path);
        }

        let multi_progress = MultiProgress::new();
        let mut summary = RunSummary::default();

        // Stage 1: source cues
        let (mut collection, warnings) = self.load_source_cues(&input_video, subtitle, &session).await?;
        for warning in &warnings {
            warn!("Skipped subtitle block at {}", warning);
        }
        summary.parse_warnings = warnings.len();
        info!("Parsed {} cues from {:?}", collection.entries.len(), collection.source_file);
        collection.write_to_srt(session.source_subtitle_path())?;

        // Stage 2: optional compression. The raw cue file is backed up first;
        // the merge is irreversible within this run.
        if let Some(merge_count) = self.config.merge_count {
            let backup = FileManager::backup_file(session.source_subtitle_path())?;
            debug!("Backed up cue file to {:?}", backup);
            collection.compress(merge_count);
            collection.write_to_srt(session.source_subtitle_path())?;
            info!("Compressed cues into {} groups of {}", collection.entries.len(), merge_count);
        }
        summary.cue_count = collection.entries.len();

        // Stage 3: translation
        let translated = self.translate_stage(&collection, &session, &multi_progress, &mut summary).await?;

        // Stage 4: per-cue synthesis and retiming
        self.synthesis_stage(&translated, &session, resume, &multi_progress, &mut summary).await?;

        // Stage 5: timeline assembly
        let video_ms = media::probe_duration_ms(&input_video).await?;
        let assembled_ms = self.assembly_stage(&input_video, &translated, &session, video_ms).await?;

        // Stage 6: final mux
        self.mux_stage(&input_video, &session, assembled_ms, video_ms, &output_path).await?;

        let elapsed = start_time.elapsed();
        info!("Dubbed video written to {:?}", output_path);
        info!(
            "Summary: {} cues, {} untranslated, {} silence-filled, {} retime fallbacks, {} resumed, {:.1}s elapsed",
            summary.cue_count,
            summary.untranslated,
            summary.silence_filled,
            summary.retime_fallbacks,
            summary.resumed,
            elapsed.as_secs_f64()
        );

        Ok(output_path)
    }

    /// Locate and parse the source-language cues.
    ///
    /// Preference order: explicit subtitle argument, sidecar `.srt` next to
    /// the video, then extraction of the video's first subtitle track.
    async fn load_source_cues(
        &self,
        input_video: &Path,
        subtitle: Option<PathBuf>,
        session: &SessionContext,
    ) -> Result<(SubtitleCollection, Vec<ParseWarning>)> {
        let subtitle_path = match subtitle {
            Some(path) => path,
            None => {
                let sidecar = input_video.with_extension("srt");
                if FileManager::file_exists(&sidecar) {
                    debug!("Using sidecar subtitle file {:?}", sidecar);
                    sidecar
                } else {
                    let extracted = session.source_subtitle_path();
                    FileManager::ensure_dir(&session.working_dir)?;
                    media::extract_subtitle_track(input_video, &extracted)
                        .await
                        .context("No subtitle input given and extraction from the video failed")?;
                    extracted
                }
            }
        };

        let (collection, warnings) =
            SubtitleCollection::load_srt(&subtitle_path, &self.config.source_language).map_err(|e| {
                error!("Cue parsing failed: {:#}", e);
                PipelineError::Parse
            })?;

        Ok((collection, warnings))
    }

    /// Translate all cues and persist the translated cue file
    async fn translate_stage(
        &self,
        collection: &SubtitleCollection,
        session: &SessionContext,
        multi_progress: &MultiProgress,
        summary: &mut RunSummary,
    ) -> Result<SubtitleCollection> {
        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(Self::bar_style("batches"));
        progress_bar.set_message("Translating");

        info!(
            "Translating {} cues to {} with {}",
            collection.entries.len(),
            self.config.target_language,
            self.config.translation.model
        );

        let service = TranslationService::new(self.config.translation.clone());
        let pb = progress_bar.clone();
        let (entries, report) = service
            .translate_collection(collection, &self.config.target_language, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await?;
        progress_bar.finish_and_clear();

        if report.untranslated > 0 {
            warn!(
                "{} of {} cues kept their source text ({} shortfall batches, {} failed batches)",
                report.untranslated,
                entries.len(),
                report.shortfall_batches,
                report.failed_batches
            );
        }
        summary.untranslated = report.untranslated;

        let translated = SubtitleCollection {
            source_file: session.translated_subtitle_path(),
            entries,
            source_language: self.config.target_language.clone(),
        };
        translated.write_to_srt(session.translated_subtitle_path())?;

        Ok(translated)
    }

    /// Synthesize and retime every cue, filling failures with silence.
    ///
    /// With `resume`, cues whose final clip already exists on disk are
    /// skipped, so an interrupted run picks up where it stopped.
    async fn synthesis_stage(
        &self,
        translated: &SubtitleCollection,
        session: &SessionContext,
        resume: bool,
        multi_progress: &MultiProgress,
        summary: &mut RunSummary,
    ) -> Result<()> {
        FileManager::ensure_dir(session.segments_dir())?;

        let synthesizer = SpeechSynthesizer::new(self.config.tts.clone());
        let sample_rate = self.config.timeline.sample_rate;
        let total = translated.entries.len();

        let progress_bar = multi_progress.add(ProgressBar::new(total as u64));
        progress_bar.set_style(Self::bar_style("cues"));
        progress_bar.set_message("Synthesizing");

        for (idx, entry) in translated.entries.iter().enumerate() {
            let final_path = session.segment_path(entry.seq_num);
            if resume && FileManager::file_exists(&final_path) {
                debug!("Cue {} already synthesized, skipping", entry.seq_num);
                summary.resumed += 1;
                progress_bar.inc(1);
                continue;
            }

            let window_ms = entry.window_ms();
            let raw_path = session.raw_segment_path(entry.seq_num);

            match synthesizer.synthesize_to_wav(&entry.text, &raw_path).await {
                Ok(()) => {
                    match retiming::retime_clip(&raw_path, &final_path, window_ms, sample_rate).await {
                        Ok(RetimeOutcome::Retimed { factor }) => {
                            debug!("Cue {} retimed with factor {:.3}", entry.seq_num, factor);
                        }
                        Ok(RetimeOutcome::Unchanged) => {}
                        Ok(RetimeOutcome::RawFallback) => {
                            summary.retime_fallbacks += 1;
                        }
                        Err(e) => {
                            warn!(
                                "{}",
                                PipelineError::Retime {
                                    cue: entry.seq_num,
                                    message: format!("{:#}", e),
                                }
                            );
                            synthesis::write_silence_wav(
                                &final_path,
                                sample_rate,
                                retiming::silence_duration_ms(window_ms),
                            )?;
                            summary.silence_filled += 1;
                        }
                    }
                    let _ = fs::remove_file(&raw_path);
                }
                Err(e) => {
                    warn!(
                        "{}",
                        PipelineError::Synthesis {
                            cue: entry.seq_num,
                            message: format!("{:#}", e),
                        }
                    );
                    synthesis::write_silence_wav(
                        &final_path,
                        sample_rate,
                        retiming::silence_duration_ms(window_ms),
                    )?;
                    summary.silence_filled += 1;
                }
            }

            progress_bar.inc(1);

            // Pacing against the external quota: long pause between fixed-size
            // batches of calls, short pause inside a batch
            if idx + 1 < total {
                let pacing = &self.config.tts;
                if pacing.pacing_batch_size > 0 && (idx + 1) % pacing.pacing_batch_size == 0 {
                    debug!("Pausing {}s between synthesis batches", pacing.inter_batch_pause_secs);
                    tokio::time::sleep(Duration::from_secs(pacing.inter_batch_pause_secs)).await;
                } else {
                    tokio::time::sleep(Duration::from_millis(pacing.intra_batch_pause_ms)).await;
                }
            }
        }
        progress_bar.finish_and_clear();

        Ok(())
    }

    /// Build the assembled audio track and return its duration in ms
    async fn assembly_stage(
        &self,
        input_video: &Path,
        translated: &SubtitleCollection,
        session: &SessionContext,
        video_ms: u64,
    ) -> Result<u64> {
        let assembler = TimelineAssembler::new(self.config.timeline.sample_rate);

        let mut base = if self.config.timeline.keep_original_audio {
            self.original_audio_base(&assembler, input_video, session, video_ms).await
        } else {
            assembler.silence_base(video_ms)
        };

        for entry in &translated.entries {
            let clip_path = session.segment_path(entry.seq_num);
            if !clip_path.exists() {
                warn!("No clip for cue {}, the timeline keeps a gap there", entry.seq_num);
                continue;
            }
            match assembler.read_clip(&clip_path) {
                Ok(clip) => assembler.overlay(&mut base, &clip, entry.start_time_ms),
                Err(e) => warn!("Unreadable clip for cue {}: {:#}", entry.seq_num, e),
            }
        }

        assembler
            .write_track(session.assembled_audio_path(), &base)
            .map_err(|e| PipelineError::Assembly(format!("{:#}", e)))?;

        Ok(assembler.duration_ms(base.len()))
    }

    /// Extract and attenuate the original audio, falling back to silence
    async fn original_audio_base(
        &self,
        assembler: &TimelineAssembler,
        input_video: &Path,
        session: &SessionContext,
        video_ms: u64,
    ) -> Vec<i16> {
        let extracted = match tempfile::Builder::new()
            .prefix("original_audio_")
            .suffix(".wav")
            .tempfile_in(&session.working_dir)
        {
            Ok(file) => file,
            Err(e) => {
                warn!("Could not create temp file for original audio: {}", e);
                return assembler.silence_base(video_ms);
            }
        };

        let result = media::extract_audio(input_video, extracted.path(), self.config.timeline.sample_rate)
            .await
            .and_then(|_| assembler.read_clip(extracted.path()));

        match result {
            Ok(samples) => {
                assembler.attenuated_base(samples, video_ms, self.config.timeline.original_volume)
            }
            Err(e) => {
                warn!("Original audio unavailable ({:#}), using a silent base track", e);
                assembler.silence_base(video_ms)
            }
        }
    }

    /// Apply the global tempo correction if needed, then remux
    async fn mux_stage(
        &self,
        input_video: &Path,
        session: &SessionContext,
        assembled_ms: u64,
        video_ms: u64,
        output_path: &Path,
    ) -> Result<()> {
        let assembled = session.assembled_audio_path();

        let mux_audio = match retiming::global_tempo_factor(assembled_ms, video_ms) {
            Some(factor) => {
                info!(
                    "Assembled audio overshoots the video ({} ms > {} ms), applying global tempo {:.3}",
                    assembled_ms, video_ms, factor
                );
                let fitted = session
                    .working_dir
                    .join(format!("dubbed_audio_{}_fit.wav", session.id));
                media::change_tempo(&assembled, &fitted, factor, self.config.timeline.sample_rate)
                    .await
                    .map_err(|e| PipelineError::Mux(format!("{:#}", e)))?;
                fitted
            }
            None => assembled,
        };

        media::mux(input_video, &mux_audio, output_path)
            .await
            .map_err(|e| PipelineError::Mux(format!("{:#}", e)))?;

        Ok(())
    }

    /// Shared progress bar style
    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%) {{msg}}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }
}
