//! # Power-Mode Request Registry
//!
//! Um colaborador "reduzido" no mesmo espírito de `panic`: qualquer parte
//! do sistema pode pedir um piso mínimo de modo de energia (por exemplo,
//! "não entre em Standby enquanto eu tiver um frame em trânsito") mantendo
//! um `PowerRequest` vivo. O modo efetivo do processo é o mais alto
//! (menos econômico) entre todos os pisos pedidos no momento.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Modos de energia, ordenados do mais ativo ao mais econômico. A ordem
/// dos variantes é significativa: `requested_power_mode` devolve o menor
/// índice (mais ativo) entre os modos com contagem de requisições > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(usize)]
pub enum PowerMode {
    Active = 0,
    Idle = 1,
    Standby = 2,
    Off = 3,
}

const MODE_COUNT: usize = 4;
const MODES: [PowerMode; MODE_COUNT] = [
    PowerMode::Active,
    PowerMode::Idle,
    PowerMode::Standby,
    PowerMode::Off,
];

static REQUEST_COUNTS: [AtomicUsize; MODE_COUNT] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];

/// Devolve o modo de energia mínimo atualmente permitido: o mais ativo
/// (menor índice) entre todos os modos com ao menos uma requisição viva.
/// Sem nenhuma requisição, o piso é o modo mais econômico (`Off`).
pub fn requested_power_mode() -> PowerMode {
    for (idx, count) in REQUEST_COUNTS.iter().enumerate() {
        if count.load(Ordering::Acquire) > 0 {
            return MODES[idx];
        }
    }
    PowerMode::Off
}

/// Uma requisição de piso mínimo de energia, viva enquanto este guard
/// existir. `Drop` decrementa a contagem do modo pedido automaticamente.
#[must_use = "dropping this immediately releases the power-mode floor it requests"]
pub struct PowerRequest {
    mode: PowerMode,
}

/// Requisita que o processo não entre em um modo de energia mais
/// econômico que `mode` enquanto o guard devolvido estiver vivo.
pub fn request_minimum_power_mode(mode: PowerMode) -> PowerRequest {
    REQUEST_COUNTS[mode as usize].fetch_add(1, Ordering::AcqRel);
    PowerRequest { mode }
}

impl Drop for PowerRequest {
    fn drop(&mut self) {
        REQUEST_COUNTS[self.mode as usize].fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `REQUEST_COUNTS` is process-wide, so tests in this module serialize
    // on a lock rather than risk one test's requests leaking into another
    // when the harness runs them on separate threads.
    static TEST_LOCK: spin::Mutex<()> = spin::Mutex::new(());

    #[test]
    fn no_requests_means_off() {
        let _guard = TEST_LOCK.lock();
        assert_eq!(requested_power_mode(), PowerMode::Off);
    }

    #[test]
    fn most_active_request_wins() {
        let _guard = TEST_LOCK.lock();
        let standby = request_minimum_power_mode(PowerMode::Standby);
        assert_eq!(requested_power_mode(), PowerMode::Standby);

        let active = request_minimum_power_mode(PowerMode::Active);
        assert_eq!(requested_power_mode(), PowerMode::Active);

        drop(active);
        assert_eq!(requested_power_mode(), PowerMode::Standby);

        drop(standby);
    }

    #[test]
    fn nested_requests_of_the_same_mode_stack() {
        let _guard = TEST_LOCK.lock();
        let a = request_minimum_power_mode(PowerMode::Idle);
        let b = request_minimum_power_mode(PowerMode::Idle);
        drop(a);
        assert_eq!(requested_power_mode(), PowerMode::Idle);
        drop(b);
    }
}
