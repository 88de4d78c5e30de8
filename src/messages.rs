//! User-visible message strings
//!
//! Every reason or status string the engine hands to a UI lives here, in the
//! wording the product shows to monitors. Callers display these verbatim, so
//! changing a string here changes what users read. Backend-sent reasons are
//! passed through untouched and never rewritten to match these.

/// Denial shown when a non-monitor account tries any room operation
pub const MONITORS_ONLY: &str = "Solo los monitores pueden acceder a salas";

/// Denial used whenever validation could not produce a real answer
///
/// Transport failures, server errors, and undecodable responses all collapse
/// into this string so a broken network can never grant access.
pub const VALIDATION_ERROR: &str = "validation error";

/// Denial used when the backend denies without giving its own reason
pub const NO_SCHEDULE_FOR_ROOM: &str =
    "No tienes un turno asignado para esta sala en este horario";

/// Refusal when an entry is attempted while an operation is still running
pub const OPERATION_IN_PROGRESS: &str = "Hay una operación en curso. Espera a que termine.";

/// Refusal when exiting without an open entry
pub const NO_ACTIVE_ENTRY: &str = "No tienes una entrada activa";

/// Refusal when re-entering the room the monitor is already inside
pub const ALREADY_IN_ROOM: &str = "Ya tienes una entrada activa en esta sala";

/// Shown when the backend could not be reached while registering
pub const BACKEND_UNREACHABLE: &str = "No se pudo contactar al servidor. Inténtalo de nuevo.";

/// Confirmation after a successful entry registration
pub const ENTRY_REGISTERED: &str = "Entrada registrada";

/// Confirmation after a successful exit registration
pub const EXIT_REGISTERED: &str = "Salida registrada";

/// Refusal when entering a room while another room's entry is still open
pub fn active_entry_elsewhere(room_label: &str) -> String {
    format!(
        "Ya tienes una entrada activa en {}. Registra la salida antes de entrar a otra sala.",
        room_label
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_closed_reason_is_stable() {
        // UIs key off this exact string to distinguish engine-side denials
        assert_eq!(VALIDATION_ERROR, "validation error");
    }

    #[test]
    fn test_no_schedule_reason_mentions_shift() {
        assert!(NO_SCHEDULE_FOR_ROOM.contains("turno"));
    }

    #[test]
    fn test_active_entry_elsewhere_includes_room() {
        let msg = active_entry_elsewhere("Sala de Redes");
        assert!(msg.contains("Sala de Redes"));
        assert!(msg.contains("salida"));
    }
}
