// =============================================================================
// STRUCTURED LOGGING - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging da runtime com custo ZERO em release.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt no caminho quente - evita geração de código de formatação
// - Ao contrário de um kernel com UART fixa, esta crate não sabe para onde
//   logar: quem a embarca instala um `LogSink` via `set_log_sink`. Sem sink
//   instalado os macros são no-ops silenciosos, preservando o custo zero.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR, WARN, INFO, DEBUG, TRACE
//
// FEATURES:
// - no_logs:   remove 100% dos logs da crate (custo zero)
// - log_error: apenas ERROR
// - log_info:  ERROR, WARN, INFO
// - log_debug: ERROR, WARN, INFO, DEBUG
// - log_trace: todos os níveis (padrão)
//
// =============================================================================

/// Nível de severidade de um registro de log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Recebe registros de log emitidos pelos macros `rt_*!`.
///
/// `value` carrega no máximo um valor numérico auxiliar, no espírito do
/// "apenas string + um hex" do sistema de logging que esta crate herda —
/// sem `core::fmt`, sem alocação.
pub trait LogSink: Sync {
    fn emit(&self, level: Level, msg: &'static str, value: Option<u64>);
}

// `&dyn LogSink` is a fat pointer (two words), so a plain `AtomicUsize`
// cannot carry it; `spin::Once` stores it behind a small internal lock
// instead, which is fine since `set_log_sink` is a cold, one-time path.
static SINK: spin::Once<&'static dyn LogSink> = spin::Once::new();

/// Installs the process-wide log sink used by the `rt_*!` macros.
///
/// Only the first call takes effect (matching the source library's
/// "settable" language loosely, erring on the side of the simplest
/// correct primitive available); later calls are silently ignored. No
/// sink installed means the macros are no-ops, not a buffered backlog.
pub fn set_log_sink(sink: &'static dyn LogSink) {
    SINK.call_once(|| sink);
}

#[doc(hidden)]
pub fn dispatch(level: Level, msg: &'static str, value: Option<u64>) {
    if let Some(sink) = SINK.get() {
        sink.emit(level, msg, value);
    }
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! rt_error {
    ($msg:expr) => {
        $crate::log::dispatch($crate::log::Level::Error, $msg, None)
    };
    ($msg:expr, $val:expr) => {
        $crate::log::dispatch($crate::log::Level::Error, $msg, Some($val as u64))
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! rt_error {
    ($($t:tt)*) => {};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! rt_warn {
    ($msg:expr) => {
        $crate::log::dispatch($crate::log::Level::Warn, $msg, None)
    };
    ($msg:expr, $val:expr) => {
        $crate::log::dispatch($crate::log::Level::Warn, $msg, Some($val as u64))
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! rt_warn {
    ($($t:tt)*) => {};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! rt_info {
    ($msg:expr) => {
        $crate::log::dispatch($crate::log::Level::Info, $msg, None)
    };
    ($msg:expr, $val:expr) => {
        $crate::log::dispatch($crate::log::Level::Info, $msg, Some($val as u64))
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! rt_info {
    ($($t:tt)*) => {};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(any(feature = "log_trace", feature = "log_debug"))]
#[macro_export]
macro_rules! rt_debug {
    ($msg:expr) => {
        $crate::log::dispatch($crate::log::Level::Debug, $msg, None)
    };
    ($msg:expr, $val:expr) => {
        $crate::log::dispatch($crate::log::Level::Debug, $msg, Some($val as u64))
    };
}

#[cfg(not(any(feature = "log_trace", feature = "log_debug")))]
#[macro_export]
macro_rules! rt_debug {
    ($($t:tt)*) => {};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================

#[cfg(feature = "log_trace")]
#[macro_export]
macro_rules! rt_trace {
    ($msg:expr) => {
        $crate::log::dispatch($crate::log::Level::Trace, $msg, None)
    };
    ($msg:expr, $val:expr) => {
        $crate::log::dispatch($crate::log::Level::Trace, $msg, Some($val as u64))
    };
}

#[cfg(not(feature = "log_trace"))]
#[macro_export]
macro_rules! rt_trace {
    ($($t:tt)*) => {};
}
