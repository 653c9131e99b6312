pub mod destination;
pub mod qr_style;
pub mod record;
pub mod scan_event;

pub use destination::Entity as DestinationEntity;
pub use qr_style::Entity as QrStyleEntity;
pub use record::Entity as RecordEntity;
pub use scan_event::Entity as ScanEventEntity;
