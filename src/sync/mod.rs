//! # Synchronization Primitives
//!
//! Pequenas células atômicas (adaptadas de uma célula de kernel de uso
//! geral) mais a pilha SPSC intrusiva lock-free que serve de substrato
//! para `event::IrqEventRuntime` e `event::set::EventSet`.

mod spsc;

pub use spsc::{SpscNode, SpscStack};

use core::sync::atomic::{AtomicBool, Ordering};

/// Wrapper de `AtomicBool` com uma API de test-and-set mais legível do
/// que chamar `swap`/`compare_exchange` diretamente nos pontos de uso.
pub struct AtomicFlag(AtomicBool);

impl AtomicFlag {
    pub const fn new(value: bool) -> Self {
        Self(AtomicBool::new(value))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Release);
    }

    /// Test-and-set: tenta transicionar de `false` para `true`, devolvendo
    /// `true` se a transição foi desta chamada (ou seja, o flag *estava*
    /// limpo) e `false` se outra chamada já o havia marcado.
    pub fn test_and_set(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_set_only_wins_once() {
        let flag = AtomicFlag::new(false);
        assert!(flag.test_and_set());
        assert!(!flag.test_and_set());
        flag.clear();
        assert!(flag.test_and_set());
    }
}
