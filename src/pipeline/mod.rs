//! Pipeline stages for receipt extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different payload format) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ encode ──▶ llm ──▶ parse
//! (load+resize) (base64)  (VLM)   (tolerant JSON)
//! ```
//!
//! 1. [`normalize`] — decode the photo and downscale to `max_width`; runs in
//!    `spawn_blocking` because decode and Lanczos resampling are CPU-bound
//! 2. [`encode`] — RGB-normalise, cap at `max_dimension`, PNG-encode, base64
//! 3. [`llm`]    — the single vision-model call; the only stage with
//!    network I/O
//! 4. [`parse`]  — recover a JSON document from the reply, or a typed
//!    failure value when it will not decode

pub mod encode;
pub mod llm;
pub mod normalize;
pub mod parse;
