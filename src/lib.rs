// (FASE2) src/lib.rs
//! Forge-RT — Interrupt-Safe Cooperative Event Runtime.
//!
//! Ponto central de exportação dos módulos da runtime.
//! ISRs postam eventos de forma lock-free; o loop de foreground os drena e
//! executa. Um serviço de deadline-timers e um pipeline de framing STX/ETX
//! são construídos sobre essa mesma primitiva.
//!
//! # Layout
//!
//! | Módulo      | Responsabilidade                                          |
//! |-------------|------------------------------------------------------------|
//! | `result`    | Extensões sobre `Result<T, E>` usadas em toda a crate.      |
//! | `error`     | Taxonomia de erros recuperáveis (`RuntimeError`).           |
//! | `log`       | Macros de logging zero-overhead, gated por feature.         |
//! | `panic`     | Registro de panic handler para `unwrap`/`unwrap_err`.       |
//! | `power`     | Registro de requisições de modo de energia (refcount).      |
//! | `sync`      | `SpscQueue` e pequenas células atômicas.                    |
//! | `list`      | Lista intrusiva duplamente encadeada (substrato de C6).     |
//! | `event`     | Runtime de eventos de IRQ (C3/C4/C5).                       |
//! | `softevent` | Serviço de soft-events sobre o runtime (C6).                |
//! | `timer`     | Deadline timers multiplexados em um clock de hardware (C7). |
//! | `framing`   | Byte-stuffing e framing STX/ETX com CRC-16/CCITT (C8/C9).   |
//!
//! Esta crate não possui `#[panic_handler]` próprio: é uma biblioteca a ser
//! embarcada em um binário que já define o seu. `#![no_std]` é suspenso sob
//! `cfg(test)` para que a suíte de testes rode com o harness padrão do host.

#![cfg_attr(not(test), no_std)]

// Habilita alocação dinâmica apenas onde realmente é necessária (closures de
// timer com captura de estado — ver `timer::DeadlineTimer::set_handler`).
// Nada no caminho quente (post/run_available) aloca.
extern crate alloc;

pub mod error;
pub mod event;
pub mod framing;
pub mod list;
pub mod log;
pub mod panic;
pub mod power;
pub mod result;
pub mod softevent;
pub mod sync;
pub mod timer;

pub use error::RuntimeError;
pub use result::ResultExt;
