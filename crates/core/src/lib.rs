pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod forms;

pub use cpq::catalog::Catalog;
pub use cpq::pricing::{compute_gross_total, DeterministicPricingEngine, PricingEngine};
pub use cpq::selection::{Selection, SelectionEntry};
pub use cpq::subsidy::{
    applicable_cap, clamp_subsidy, net_price, DeterministicSubsidyEngine, SubsidyCapTable,
    SubsidyCaps, SubsidyEngine,
};
pub use cpq::{CpqEvaluation, CpqRuntime, DeterministicCpqRuntime};
pub use domain::customer::Customer;
pub use domain::product::CatalogItem;
pub use domain::quote::{LineItem, QuotationResult, QuoteState, QuoteSummary};
pub use domain::receipt::{PaymentMode, ProformaReceipt, ReceiptForm, ReceiptQuantity};
pub use domain::role::Role;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::SubsidyState;
pub use forms::QuoteForm;
