//! HLS stream relay
//!
//! Fetches playlists and segments from upstream hosts while presenting a
//! browser identity, rewrites playlists so every entry routes back through
//! the relay, and streams binary bodies to the client.

pub mod fetcher;
pub mod relay;
pub mod rewrite;

pub use fetcher::{UpstreamFetcher, UpstreamResponse};
pub use relay::{
    classify_body, parse_target, proxy_options_preflight, BodyKind, StreamRelay,
    FOOTBALL_STREAM_PATH, MANIFEST_CONTENT_TYPE, TV_STREAM_PATH,
};
pub use rewrite::{classify_line, proxy_url, rewrite_manifest, LineKind, ManifestRewriter};
