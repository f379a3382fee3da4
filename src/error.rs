//! # Runtime Error Taxonomy
//!
//! Define os códigos de erro recuperáveis retornados pela runtime.
//! Ao contrário de um kernel POSIX, a maioria dos erros aqui vem de
//! contenção (lock de payload perdido, slot de evento esgotado) ou de
//! bytes corrompidos na borda de um frame — não de um sistema de arquivos
//! ou de processos.
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Uniformidade:** todo componente que pode falhar (C4, C5, C9) retorna
//!   uma variante deste enum através de `Result<_, RuntimeError>`.
//! - **Custo zero sob `no_logs`:** as mensagens de `Display` existem apenas
//!   como `&'static str`; nenhuma formatação é feita.

use core::fmt;

/// Erros recuperáveis produzidos pela runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// C5: todos os slots do conjunto de eventos estão em voo.
    EventSetFull,
    /// C4/C5: `try_set_data` perdeu a corrida pelo payload-lock.
    EventLockFailed,
    /// C9: o CRC recebido não confere com o calculado sobre o payload.
    FrameBadCrc,
    /// C9: um STX inesperado apareceu antes do ETX, ou o frame terminou
    /// sem os dois bytes de CRC acumulados em `history`.
    FrameBadFraming,
    /// C9: o ETX chegou enquanto o unstuffer ainda esperava o byte
    /// complementar de um `DLE`.
    FrameBadByteStuffing,
}

impl RuntimeError {
    /// Mensagem estática associada ao erro. Nunca aloca.
    pub const fn message(self) -> &'static str {
        match self {
            RuntimeError::EventSetFull => "event set full",
            RuntimeError::EventLockFailed => "failed to set event data",
            RuntimeError::FrameBadCrc => "bad crc",
            RuntimeError::FrameBadFraming => "bad framing",
            RuntimeError::FrameBadByteStuffing => "bad bytestuffing",
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
