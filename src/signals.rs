use std::sync::OnceLock;

use nix::sys::signal::{self, SigHandler, Signal};

use crate::cancel::CancellationToken;

static INTERRUPT: OnceLock<CancellationToken> = OnceLock::new();

/// Install SIGINT/SIGTERM handlers that cancel `token`.
///
/// Only the first token registered is ever cancelled; later calls reinstall
/// the handlers but keep the original token.
pub fn install_interrupt_handler(token: CancellationToken) -> nix::Result<()> {
    let _ = INTERRUPT.set(token);

    // SAFETY: the handler only performs an atomic load and an atomic store.
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_interrupt))?;
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_interrupt))?;
    }

    Ok(())
}

extern "C" fn handle_interrupt(_: i32) {
    cancel_registered(&INTERRUPT);
}

/// Cancel the token held in `slot`, if one was registered.
fn cancel_registered(slot: &OnceLock<CancellationToken>) {
    if let Some(token) = slot.get() {
        token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_registered_trips_token() {
        let slot = OnceLock::new();
        let token = CancellationToken::new();
        slot.set(token.clone()).unwrap();

        cancel_registered(&slot);

        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_registered_keeps_first_token() {
        let slot = OnceLock::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        slot.set(first.clone()).unwrap();
        assert!(slot.set(second.clone()).is_err());

        cancel_registered(&slot);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_cancel_registered_without_token_is_noop() {
        let slot: OnceLock<CancellationToken> = OnceLock::new();
        cancel_registered(&slot);
        assert!(slot.get().is_none());
    }
}
