//! Session-related types.
//!
//! A shopper can hold one cart per company in the same session, so every
//! key is scoped by company ID.

/// Session keys for cart data.
pub mod keys {
    use stockyard_core::CompanyId;

    /// Key for the serialized cart of `company_id`.
    #[must_use]
    pub fn cart(company_id: CompanyId) -> String {
        format!("cart:{company_id}")
    }

    /// Key for the timestamp of an unfinished checkout of `company_id`.
    #[must_use]
    pub fn checkout_in_flight(company_id: CompanyId) -> String {
        format!("checkout_in_flight:{company_id}")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_keys_are_scoped_by_company() {
            assert_eq!(cart(CompanyId::new(7)), "cart:7");
            assert_ne!(cart(CompanyId::new(7)), cart(CompanyId::new(8)));
            assert_ne!(cart(CompanyId::new(7)), checkout_in_flight(CompanyId::new(7)));
        }
    }
}
