pub mod playbook;
pub mod ticket;

pub use playbook::{Playbook, PlaybookStep, PlaybookTrigger};
pub use ticket::{Ticket, TicketAnalysis, TicketPriority, TicketStatus};
