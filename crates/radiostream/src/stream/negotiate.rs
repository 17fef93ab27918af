//! Stream negotiation
//!
//! Issues the GET, follows playlist files to the stream they name, and turns
//! the response headers into a `Negotiated` description. Every failure path
//! closes the connection it opened.

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::ConnectError;
use crate::stream::http::{Connection, Connector, StreamRequest};
use crate::stream::icy::parse_metaint;
use crate::stream::playlist::{first_stream_url, is_playlist_type, media_type};
use crate::stream::types::{ByteBudget, Codec, Negotiated, OpenOptions};

/// Codec for an audio content type, `None` when unsupported
pub fn classify_codec(content_type: &str) -> Option<Codec> {
    let media = media_type(content_type);
    match media.as_str() {
        "audio/mpeg" => Some(Codec::Mp3),
        "audio/wav" => Some(Codec::Wav),
        "audio/aacp" => Some(Codec::AacPlus),
        m if m.starts_with("audio/aac") => Some(Codec::Aac),
        _ => None,
    }
}

fn has_supported_scheme(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn is_chunked(transfer_encoding: Option<&str>) -> bool {
    transfer_encoding
        .and_then(|v| v.rsplit(',').next())
        .is_some_and(|last| last.trim().eq_ignore_ascii_case("chunked"))
}

/// Negotiate a stream for `url`, following at most
/// `config.max_playlist_depth` playlist hops.
///
/// `options` apply to every request in the chain and are not kept afterwards.
pub fn negotiate<C: Connector + ?Sized>(
    connector: &mut C,
    url: &str,
    options: &OpenOptions,
    config: &SessionConfig,
) -> Result<(Negotiated, Box<dyn Connection>), ConnectError> {
    let mut target = url.trim().to_string();

    for _ in 0..config.max_playlist_depth {
        if !has_supported_scheme(&target) {
            warn!(url = %target, "unsupported URL scheme");
            return Err(ConnectError::UnsupportedScheme(target));
        }
        if !connector.network_available() {
            warn!("no active network");
            return Err(ConnectError::NoNetwork);
        }

        let request = StreamRequest {
            url: &target,
            request_metadata: config.request_metadata,
            range_start: options.range_start,
            credentials: options.credentials.as_ref(),
            connect_timeout: config.connect_timeout_for(&target),
            read_timeout: config.read_timeout(),
            user_agent: &config.user_agent,
        };
        let mut conn = connector.open(&request)?;

        let status = conn.status();
        if status != 200 && status != 206 {
            warn!(url = %target, status, "stream request refused");
            conn.close();
            return Err(ConnectError::HttpStatus(status));
        }
        if status == 206 {
            debug!("server can resume");
        }

        let content_type = conn.header("content-type").unwrap_or_default().to_string();

        if is_playlist_type(&content_type) {
            let body = conn.read_to_string(config.max_playlist_bytes);
            conn.close();
            let next = first_stream_url(&body?).ok_or_else(|| {
                warn!(url = %target, "no url found in playlist");
                ConnectError::PlaylistWithoutUrl
            })?;
            info!(from = %target, to = %next, "following playlist");
            target = next;
            continue;
        }

        let Some(codec) = classify_codec(&content_type) else {
            warn!(url = %target, %content_type, "unsupported content type");
            conn.close();
            return Err(ConnectError::UnsupportedContentType(content_type));
        };

        let station_name = conn
            .header("icy-name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let metaint = parse_metaint(conn.header("icy-metaint"));
        let chunked = is_chunked(conn.header("transfer-encoding"));
        let budget = if chunked {
            ByteBudget::Unbounded
        } else {
            let declared = conn.content_length().or_else(|| {
                conn.header("content-length")
                    .and_then(|v| v.trim().parse::<u64>().ok())
            });
            ByteBudget::from_content_length(declared)
        };

        debug!(
            url = %target,
            %codec,
            metaint,
            chunked,
            length = ?budget.remaining(),
            "stream negotiated"
        );

        let negotiated = Negotiated {
            url: target,
            codec,
            station_name,
            metaint,
            chunked,
            budget,
            resumed: status == 206,
        };
        return Ok((negotiated, conn));
    }

    warn!(depth = config.max_playlist_depth, "playlist chain too deep");
    Err(ConnectError::PlaylistTooDeep(config.max_playlist_depth))
}
