mod helpers;
mod mocks;

mod initiation;
mod notifications;
mod order_status;
