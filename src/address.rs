//! Pane addressing: parsing raw identifiers and resolving them against tmux.
//!
//! Three input forms are accepted:
//! - a bare pane index (`2`), relative to the caller's current window;
//! - a fully qualified `session:window.pane` address;
//! - a tmux pane id (`%17`).
//!
//! Parsing is purely syntactic and reports `InvalidAddress`. Resolution then
//! asks the multiplexer to confirm the pane exists, so a caller only ever sees
//! a fully resolved address or `TargetNotFound`.

use serde::Serialize;
use std::fmt;

use crate::error::ControllerError;
use crate::tmux::Multiplexer;

/// Canonical `session:window.pane` address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PaneAddress {
    pub session: String,
    pub window: u32,
    pub pane: u32,
}

impl PaneAddress {
    pub fn new(session: impl Into<String>, window: u32, pane: u32) -> Self {
        Self {
            session: session.into(),
            window,
            pane,
        }
    }

    /// Target string passed to `tmux -t`.
    ///
    /// The leading `=` forces an exact session-name match; tmux otherwise
    /// accepts unique prefixes and would silently pick a different session.
    pub fn tmux_target(&self) -> String {
        format!("={}:{}.{}", self.session, self.window, self.pane)
    }

    /// `session:window` part of this address.
    pub fn window_scope(&self) -> WindowScope {
        WindowScope {
            session: self.session.clone(),
            window: self.window,
        }
    }
}

impl fmt::Display for PaneAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.session, self.window, self.pane)
    }
}

/// A `session:window` pair used to scope pane listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WindowScope {
    pub session: String,
    pub window: u32,
}

impl WindowScope {
    pub fn tmux_target(&self) -> String {
        format!("={}:{}", self.session, self.window)
    }

    /// Parse `session:window`.
    pub fn parse(raw: &str) -> Result<Self, ControllerError> {
        let trimmed = raw.trim();
        let (session, window) = trimmed
            .split_once(':')
            .ok_or_else(|| ControllerError::invalid_address(raw, "expected `session:window`"))?;
        if session.is_empty() {
            return Err(ControllerError::invalid_address(raw, "session name is empty"));
        }
        let window = parse_index(raw, window, "window")?;
        Ok(Self {
            session: session.to_string(),
            window,
        })
    }
}

impl fmt::Display for WindowScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session, self.window)
    }
}

/// The caller's current location, used to expand bare pane indexes.
///
/// Passed explicitly rather than read from the environment so resolution can
/// be exercised against synthetic contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneContext {
    pub session: String,
    pub window: u32,
}

impl PaneContext {
    pub fn new(session: impl Into<String>, window: u32) -> Self {
        Self {
            session: session.into(),
            window,
        }
    }
}

impl From<&PaneAddress> for PaneContext {
    fn from(address: &PaneAddress) -> Self {
        Self::new(address.session.clone(), address.window)
    }
}

/// Syntactically valid target awaiting existence confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneTarget {
    Address(PaneAddress),
    /// tmux pane id including the `%` prefix.
    Id(String),
}

impl PaneTarget {
    pub fn tmux_target(&self) -> String {
        match self {
            Self::Address(address) => address.tmux_target(),
            Self::Id(id) => id.clone(),
        }
    }
}

impl fmt::Display for PaneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => address.fmt(f),
            Self::Id(id) => f.write_str(id),
        }
    }
}

/// Parse a raw pane identifier without touching the multiplexer.
pub fn parse_target(
    raw: &str,
    context: Option<&PaneContext>,
) -> Result<PaneTarget, ControllerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ControllerError::invalid_address(raw, "pane address is empty"));
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let pane = parse_index(raw, trimmed, "pane")?;
        let Some(context) = context else {
            return Err(ControllerError::invalid_address(
                raw,
                "a bare pane index needs a current window; use `session:window.pane`",
            ));
        };
        return Ok(PaneTarget::Address(PaneAddress::new(
            context.session.clone(),
            context.window,
            pane,
        )));
    }

    if let Some(id) = trimmed.strip_prefix('%') {
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(PaneTarget::Id(trimmed.to_string()));
        }
        return Err(ControllerError::invalid_address(
            raw,
            "pane ids look like `%12`",
        ));
    }

    if trimmed.contains(':') && trimmed.contains('.') {
        return parse_qualified(raw, trimmed).map(PaneTarget::Address);
    }

    Err(ControllerError::invalid_address(
        raw,
        "expected a pane index, `session:window.pane`, or a `%id` pane id",
    ))
}

fn parse_qualified(raw: &str, trimmed: &str) -> Result<PaneAddress, ControllerError> {
    // tmux rewrites ':' and '.' in session names, so the first ':' always
    // ends the session part.
    let (session, rest) = trimmed
        .split_once(':')
        .ok_or_else(|| ControllerError::invalid_address(raw, "missing `:`"))?;
    if session.is_empty() {
        return Err(ControllerError::invalid_address(raw, "session name is empty"));
    }
    if session.contains('.') {
        return Err(ControllerError::invalid_address(
            raw,
            "session names cannot contain `.`",
        ));
    }
    let (window, pane) = rest
        .split_once('.')
        .ok_or_else(|| ControllerError::invalid_address(raw, "missing `.` before pane index"))?;
    Ok(PaneAddress::new(
        session,
        parse_index(raw, window, "window")?,
        parse_index(raw, pane, "pane")?,
    ))
}

fn parse_index(raw: &str, part: &str, what: &str) -> Result<u32, ControllerError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ControllerError::invalid_address(
            raw,
            format!("{what} index `{part}` is not a number"),
        ));
    }
    part.parse::<u32>().map_err(|_| {
        ControllerError::invalid_address(raw, format!("{what} index `{part}` is out of range"))
    })
}

/// Parse and confirm that the pane exists.
pub async fn resolve<M>(
    mux: &M,
    raw: &str,
    context: Option<&PaneContext>,
    operation: &str,
) -> Result<PaneAddress, ControllerError>
where
    M: Multiplexer + ?Sized,
{
    let target = parse_target(raw, context)?;
    match mux.describe_pane(&target).await {
        Ok(info) => Ok(info.address),
        Err(err) if err.is_target_not_found() => {
            Err(ControllerError::not_found(target.to_string(), operation))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::FakeMux;

    fn ctx() -> PaneContext {
        PaneContext::new("work", 1)
    }

    #[test]
    fn bare_index_expands_against_context() {
        let target = parse_target("2", Some(&ctx())).unwrap();
        assert_eq!(target, PaneTarget::Address(PaneAddress::new("work", 1, 2)));
    }

    #[test]
    fn bare_index_without_context_is_invalid() {
        let err = parse_target("2", None).unwrap_err();
        assert_eq!(err.kind(), "invalid_address");
        assert!(err.to_string().contains("session:window.pane"), "got: {err}");
    }

    #[test]
    fn qualified_form_parses_strictly() {
        assert_eq!(
            parse_target("agents:3.0", None).unwrap(),
            PaneTarget::Address(PaneAddress::new("agents", 3, 0))
        );
        for raw in ["agents:x.0", ":1.2", "agents:1.", "agents:1.2.3", "a.b:1.2"] {
            let err = parse_target(raw, None).unwrap_err();
            assert_eq!(err.kind(), "invalid_address", "raw={raw}");
        }
    }

    #[test]
    fn pane_ids_are_accepted() {
        assert_eq!(
            parse_target("%17", None).unwrap(),
            PaneTarget::Id("%17".to_string())
        );
        assert!(parse_target("%", None).is_err());
        assert!(parse_target("%a1", None).is_err());
    }

    #[test]
    fn other_shapes_are_rejected() {
        for raw in ["", "  ", "work", "work:1", "-1", "1.2"] {
            assert!(parse_target(raw, Some(&ctx())).is_err(), "raw={raw:?}");
        }
    }

    #[test]
    fn display_and_tmux_target_differ_only_by_exact_match_prefix() {
        let address = PaneAddress::new("work", 1, 2);
        assert_eq!(address.to_string(), "work:1.2");
        assert_eq!(address.tmux_target(), "=work:1.2");
        assert_eq!(address.window_scope().tmux_target(), "=work:1");
    }

    #[test]
    fn window_scope_parses() {
        assert_eq!(
            WindowScope::parse("work:4").unwrap(),
            WindowScope {
                session: "work".into(),
                window: 4
            }
        );
        assert!(WindowScope::parse("work").is_err());
        assert!(WindowScope::parse(":4").is_err());
    }

    #[tokio::test]
    async fn resolve_confirms_existence() {
        let mux = FakeMux::new();
        mux.add_session("work", 1, 3);
        let address = resolve(&mux, "2", Some(&ctx()), "capture").await.unwrap();
        assert_eq!(address, PaneAddress::new("work", 1, 2));

        let err = resolve(&mux, "work:1.9", None, "capture").await.unwrap_err();
        assert!(err.is_target_not_found());
        assert_eq!(err.to_string(), "capture: target `work:1.9` not found");
    }

    #[tokio::test]
    async fn resolve_maps_pane_id_to_address() {
        let mux = FakeMux::new();
        mux.add_session("work", 0, 2);
        let id = mux.pane_id(&PaneAddress::new("work", 0, 1)).unwrap();
        let address = resolve(&mux, &id, None, "send").await.unwrap();
        assert_eq!(address, PaneAddress::new("work", 0, 1));
    }

    #[tokio::test]
    async fn bare_and_qualified_forms_resolve_identically() {
        let mux = FakeMux::new();
        mux.add_session("work", 1, 4);
        for pane in 0..4u32 {
            let bare = resolve(&mux, &pane.to_string(), Some(&ctx()), "t").await.unwrap();
            let full = resolve(&mux, &format!("work:1.{pane}"), None, "t").await.unwrap();
            assert_eq!(bare, full);
        }
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bare_index_matches_qualified_form(
                session in "[a-z][a-z0-9_-]{0,12}",
                window in 0u32..1000,
                pane in 0u32..1000,
            ) {
                let context = PaneContext::new(session.clone(), window);
                let bare = parse_target(&pane.to_string(), Some(&context)).unwrap();
                let full = parse_target(&format!("{session}:{window}.{pane}"), None).unwrap();
                prop_assert_eq!(bare, full);
            }

            #[test]
            fn parse_never_panics(raw in ".{0,40}") {
                let _ = parse_target(&raw, Some(&PaneContext::new("s", 0)));
            }

            #[test]
            fn display_round_trips(
                session in "[a-z][a-z0-9_-]{0,12}",
                window in 0u32..1000,
                pane in 0u32..1000,
            ) {
                let address = PaneAddress::new(session, window, pane);
                let parsed = parse_target(&address.to_string(), None).unwrap();
                prop_assert_eq!(parsed, PaneTarget::Address(address));
            }
        }
    }
}
