mod account_names;
mod references;

pub use account_names::{account_names_match, normalize_account_name};
pub use references::{
    generate_order_number,
    generate_payment_reference,
    generate_transaction_reference,
    generate_withdrawal_reference,
    restaurant_commission_reference,
    rider_commission_reference,
};
