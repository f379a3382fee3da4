//! # `Result<T, E>` Extensions
//!
//! O host já fornece um `Result<T, E>` que satisfaz as invariantes do
//! componente de resultado desta runtime: é uma união discriminada de
//! sucesso/erro, propaga com `?`, e já tem `map`/`and_then`/`unwrap_or`
//! etc. Reimplementar um tipo próprio só duplicaria a `std`. O que falta
//! é um punhado de operações de conveniência específicas desta runtime —
//! é isso que `ResultExt` adiciona, mais um `unwrap`/`unwrap_err` que
//! passam primeiro pelo registro de panic handler (`crate::panic`) antes
//! de invocar o `panic!` real do host.

/// Operações adicionais sobre `Result<T, E>` usadas pela runtime.
pub trait ResultExt<T, E> {
    /// Descarta o valor de sucesso, mantendo apenas o erro. Útil quando
    /// uma operação (`post`, `try_set_data`) só importa pelo seu efeito
    /// colateral e pelo caminho de erro.
    fn ignore_value(self) -> Result<(), E>;

    /// `Some(t)` em caso de sucesso, `None` em caso de erro — descarta o
    /// próprio erro. Uso típico: sondar um resultado sem propagar `E`.
    fn maybe_value(self) -> Option<T>;

    /// `Some(e)` em caso de erro, `None` em caso de sucesso — descarta o
    /// valor de sucesso.
    fn maybe_error(self) -> Option<E>;

    /// Como `unwrap`, mas notifica o observador de pânico instalado via
    /// `crate::panic::set_panic_handler` antes de entrar em pânico.
    fn unwrap_checked(self) -> T
    where
        E: core::fmt::Debug;

    /// Como `unwrap_err`, mas notifica o observador de pânico instalado
    /// via `crate::panic::set_panic_handler` antes de entrar em pânico.
    fn unwrap_err_checked(self) -> E
    where
        T: core::fmt::Debug;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn ignore_value(self) -> Result<(), E> {
        self.map(|_| ())
    }

    fn maybe_value(self) -> Option<T> {
        self.ok()
    }

    fn maybe_error(self) -> Option<E> {
        self.err()
    }

    #[track_caller]
    fn unwrap_checked(self) -> T
    where
        E: core::fmt::Debug,
    {
        match self {
            Ok(value) => value,
            Err(_) => {
                crate::panic::notify("called `unwrap_checked()` on an `Err` value");
                self_was_err_panic()
            }
        }
    }

    #[track_caller]
    fn unwrap_err_checked(self) -> E
    where
        T: core::fmt::Debug,
    {
        match self {
            Err(err) => err,
            Ok(_) => {
                crate::panic::notify("called `unwrap_err_checked()` on an `Ok` value");
                self_was_ok_panic()
            }
        }
    }
}

// Kept out of line so `unwrap_checked`/`unwrap_err_checked` stay small and
// inlinable up to the notify call; the actual panic message construction
// (which needs `E: Debug`/`T: Debug`) happens at the call site instead,
// since a shared `-> !` helper can't be generic over the discarded value's
// `Debug` bound without carrying it along.
#[track_caller]
fn self_was_err_panic() -> ! {
    panic!("called `unwrap_checked()` on an `Err` value")
}

#[track_caller]
fn self_was_ok_panic() -> ! {
    panic!("called `unwrap_err_checked()` on an `Ok` value")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_value_keeps_only_the_error() {
        let ok: Result<u32, &str> = Ok(5);
        let err: Result<u32, &str> = Err("nope");
        assert_eq!(ok.ignore_value(), Ok(()));
        assert_eq!(err.ignore_value(), Err("nope"));
    }

    #[test]
    fn maybe_value_and_maybe_error_discard_the_other_side() {
        let ok: Result<u32, &str> = Ok(5);
        let err: Result<u32, &str> = Err("nope");
        assert_eq!(ok.maybe_value(), Some(5));
        assert_eq!(Result::<u32, &str>::Err("nope").maybe_value(), None);
        assert_eq!(err.maybe_error(), Some("nope"));
        assert_eq!(Result::<u32, &str>::Ok(5).maybe_error(), None);
    }

    #[test]
    fn unwrap_checked_returns_the_ok_value() {
        let ok: Result<u32, &str> = Ok(7);
        assert_eq!(ok.unwrap_checked(), 7);
    }

    #[test]
    #[should_panic(expected = "unwrap_checked")]
    fn unwrap_checked_panics_on_err() {
        let err: Result<u32, &str> = Err("nope");
        let _ = err.unwrap_checked();
    }

    #[test]
    fn unwrap_err_checked_returns_the_err_value() {
        let err: Result<u32, &str> = Err("nope");
        assert_eq!(err.unwrap_err_checked(), "nope");
    }

    #[test]
    #[should_panic(expected = "unwrap_err_checked")]
    fn unwrap_err_checked_panics_on_ok() {
        let ok: Result<u32, &str> = Ok(7);
        let _ = ok.unwrap_err_checked();
    }
}
