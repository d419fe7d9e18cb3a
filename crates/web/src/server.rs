//! A minimal host that answers one request per connection.
//!
//! Each accepted stream is parsed with [`RequestParser`], run through the
//! [`AsyncPipeline`] and answered with a status line plus an optional body;
//! the connection is closed afterwards.

mod response_encoder;

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use futures::SinkExt;
use http::StatusCode;
use strata_http::codec::RequestParser;
use strata_http::config::ParserConfig;
use strata_http::protocol::{ParseError, ParseErrorKind};
use strata_http::stream::{ByteStream, ReaderStream};
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::net::TcpListener;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::pipeline::AsyncPipeline;
use crate::server::response_encoder::ResponseEncoder;
use crate::{Outcome, RequestContext, ResponseStatus};

#[derive(Debug)]
pub struct ServerBuilder {
    pipeline: Option<AsyncPipeline>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    parser_config: ParserConfig,
    fallback_status: StatusCode,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { pipeline: None, address: None, parser_config: ParserConfig::default(), fallback_status: StatusCode::NOT_FOUND }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn pipeline(mut self, pipeline: AsyncPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn parser_config(mut self, parser_config: ParserConfig) -> Self {
        self.parser_config = parser_config;
        self
    }

    /// Status sent when no responder answered the request, `404 Not Found` by default.
    pub fn fallback_status(mut self, fallback_status: StatusCode) -> Self {
        self.fallback_status = fallback_status;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let pipeline = self.pipeline.ok_or(ServerBuildError::MissingPipeline)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::InvalidAddress)?;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }
        Ok(Server {
            pipeline,
            address,
            parser: RequestParser::new(self.parser_config),
            fallback_status: self.fallback_status,
        })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("pipeline must be set")]
    MissingPipeline,
    #[error("address must be set")]
    MissingAddress,
    #[error("address could not be resolved: {0}")]
    InvalidAddress(#[source] io::Error),
}

#[derive(Debug)]
pub struct Server {
    pipeline: AsyncPipeline,
    address: Vec<SocketAddr>,
    parser: RequestParser,
    fallback_status: StatusCode,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    pub async fn start(self) {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            warn!("global tracing subscriber already set, keeping it");
        }

        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return;
            }
        };

        let server = Arc::new(self);
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let server = server.clone();

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let cancel = CancellationToken::new();
                // anything still holding a clone stops once the connection task ends
                let _cancel_on_exit = cancel.clone().drop_guard();
                match server.serve(ReaderStream::new(reader), writer, &cancel).await {
                    Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(%remote_addr, cause = %e, "connection failed"),
                }
            });
        }
    }

    /// Answers the single request read from `stream` on `writer`.
    ///
    /// Streams that end or get cancelled before a complete head are closed
    /// without a response.
    ///
    /// A peer hang-up is only observed on the read side, as the end of
    /// `stream`; once the head is parsed the pipeline runs until `cancel`
    /// fires or it finishes. A cancelled pipeline gets no response either.
    pub async fn serve<S, W>(&self, stream: S, writer: W, cancel: &CancellationToken) -> io::Result<()>
    where
        S: ByteStream + 'static,
        W: AsyncWrite + Unpin,
    {
        let response = match self.parser.parse(stream, cancel).await {
            Ok(request) => {
                let ctx = RequestContext::from(request);
                match self.respond(self.pipeline.run(&ctx, cancel).await) {
                    Some(response) => response,
                    None => return Ok(()),
                }
            }
            Err(e) => match rejection(&e) {
                Some(response) => response,
                None => {
                    debug!(cause = %e, "stream closed before a request head");
                    return Ok(());
                }
            },
        };

        let mut framed = FramedWrite::new(writer, ResponseEncoder);
        framed.send(response).await
    }

    fn respond(&self, outcome: Outcome<ResponseStatus>) -> Option<ResponseStatus> {
        if outcome.is_cancelled() {
            return None;
        }
        let (success, value, errors) = outcome.into_parts();
        match value {
            Some(response) => Some(response),
            None if success || errors.is_empty() => Some(ResponseStatus::new(self.fallback_status)),
            None => {
                for e in &errors {
                    warn!(cause = %e, "responder failed");
                }
                Some(ResponseStatus::new(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }
}

/// The response to a request head that could not be parsed, if one is owed.
fn rejection(error: &ParseError) -> Option<ResponseStatus> {
    match error.kind() {
        ParseErrorKind::NoData | ParseErrorKind::Cancelled => None,
        ParseErrorKind::LineTooLong | ParseErrorKind::HeaderSizeExceeded => {
            Some(ResponseStatus::text(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE, error.to_string()))
        }
        _ => Some(ResponseStatus::text(StatusCode::BAD_REQUEST, error.to_string())),
    }
}
