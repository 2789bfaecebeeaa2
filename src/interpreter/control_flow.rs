/// Signal threaded up through the statement-list walker. `BREAK` travels as
/// a control signal, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Normal,
    BreakSwitch,
}
