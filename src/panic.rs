//! # Panic Handler Registry
//!
//! A runtime embarcada não instala um `#[panic_handler]` — isso é
//! responsabilidade exclusiva do binário final. O que esta crate oferece é
//! um ponto de extensão de menor peso: um slot process-wide para um
//! callback observado imediatamente antes de `unwrap`/`unwrap_err`
//! entrarem em pânico de fato (ver `result::ResultExt`), útil para logar
//! contexto extra ou piscar um LED de erro antes do `#[panic_handler]`
//! global assumir.

use core::panic::Location;

/// Contexto de uma falha de `unwrap`/`unwrap_err` reportado ao handler
/// instalado, se houver algum.
#[derive(Debug, Clone, Copy)]
pub struct PanicReport {
    pub message: &'static str,
    pub location: &'static Location<'static>,
}

/// Recebe o relatório de uma falha de `unwrap`/`unwrap_err` antes do
/// pânico efetivo do processo.
pub trait PanicObserver: Sync {
    fn observe(&self, report: PanicReport);
}

static HANDLER: spin::Once<&'static dyn PanicObserver> = spin::Once::new();

/// Instala o observador de pânico process-wide. Apenas a primeira chamada
/// tem efeito; chamadas subsequentes são ignoradas silenciosamente.
pub fn set_panic_handler(handler: &'static dyn PanicObserver) {
    HANDLER.call_once(|| handler);
}

/// Notifica o observador instalado, se houver. Chamado por
/// `result::ResultExt` antes de propagar o pânico real via `panic!`.
#[track_caller]
pub(crate) fn notify(message: &'static str) {
    if let Some(handler) = HANDLER.get() {
        handler.observe(PanicReport {
            message,
            location: Location::caller(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    struct CountingObserver(AtomicUsize);

    impl PanicObserver for CountingObserver {
        fn observe(&self, _report: PanicReport) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    // `HANDLER` is a single process-wide `spin::Once`, so both assertions
    // live in one test to avoid ordering races against other tests in this
    // module when the harness runs them concurrently.
    #[test]
    fn install_is_first_writer_wins_and_notifies_it() {
        static FIRST: CountingObserver = CountingObserver(AtomicUsize::new(0));
        static SECOND: CountingObserver = CountingObserver(AtomicUsize::new(0));

        notify("before any handler is installed");

        set_panic_handler(&FIRST);
        set_panic_handler(&SECOND);
        notify("boom");

        assert_eq!(FIRST.0.load(Ordering::SeqCst), 1);
        assert_eq!(SECOND.0.load(Ordering::SeqCst), 0);
    }
}
