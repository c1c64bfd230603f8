/*!
 * # slidecast - Slides plus narration into a video
 *
 * A Rust library for turning a PDF deck, a recorded talk and a list of slide switch
 * times into a single MP4 where every slide is on screen while it is being talked about.
 *
 * ## Features
 *
 * - Timeline files as plain timestamp lists or `{t, page}` records
 * - Time labels as seconds or `HH:MM:SS.s` strings
 * - Cut intervals removed from the audio, with slide switches moved to match
 * - Per-stage caching of rendered slides and cleaned audio
 * - Caption dump to sentence list helper for authoring timelines
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `interval_set`: Merged half-open cut intervals and time shifting
 * - `timeline`: Timeline and cuts file parsing
 * - `remapper`: Moving slide switches onto the cleaned audio time axis
 * - `slide_renderer`: PDF pages to images (pdftoppm)
 * - `audio_cleaner`: Cutting intervals out of the audio (ffmpeg)
 * - `composer`: Slide stream encoding and muxing (ffmpeg)
 * - `media_tools`: External program invocation with timeouts
 * - `workdir`: Work directory layout and stage cache manifests
 * - `transcript`: Caption JSON to sentences
 * - `app_config`: Configuration management
 * - `app_controller`: Main pipeline
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio_cleaner;
pub mod composer;
pub mod errors;
pub mod file_utils;
pub mod interval_set;
pub mod media_tools;
pub mod remapper;
pub mod slide_renderer;
pub mod timeline;
pub mod transcript;
pub mod workdir;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BuildPlan, BuildRequest, Controller};
pub use errors::{AppError, InputError, TimelineError, ToolError};
pub use interval_set::{CutInterval, IntervalSet};
pub use remapper::{CleanedTimeline, TimelineRemapper};
pub use timeline::{Timeline, TimelinePoint};
