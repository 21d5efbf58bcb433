//! Promotional codes that can be dropped into an email as discount blocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::email::block::DiscountContent;
use crate::{Config, Result};

/// Active promotional code as offered by a discount source.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscountCode {
    /// Code customers enter at checkout.
    pub id: String,
    pub percent_off: Option<Decimal>,
    /// Fixed amount, in major currency units.
    pub amount_off: Option<Decimal>,
    pub currency: Option<String>,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl DiscountCode {
    /// Short human-readable description of the discount, e.g. `20% off`.
    pub fn summary(&self) -> String {
        if let Some(percent) = self.percent_off {
            format!("{}% off", percent.normalize())
        } else if let Some(amount) = self.amount_off {
            match &self.currency {
                Some(currency) => format!(
                    "{:.*} {} off",
                    minor_units(currency) as usize,
                    amount,
                    currency.to_uppercase()
                ),
                None => format!("{:.2} off", amount),
            }
        } else {
            "Special offer".to_string()
        }
    }

    pub fn is_active_at(&self, time: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expiry| expiry > time)
    }

    /// Content for a discount block advertising this code.
    pub fn to_content(&self) -> DiscountContent {
        let description = if self.name.trim().is_empty() {
            self.summary()
        } else {
            format!("{}: {}", self.name, self.summary())
        };
        DiscountContent {
            code: self.id.clone(),
            description,
            expiry: self
                .expires_at
                .map(|expiry| expiry.format("%B %-d, %Y").to_string()),
        }
    }
}

/// Currencies whose amounts have no minor unit, as listed by Stripe.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Number of decimal digits in the minor unit of an ISO currency code.
pub fn minor_units(currency: &str) -> u32 {
    if ZERO_DECIMAL_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(currency))
    {
        0
    } else {
        2
    }
}

/// Provider of currently redeemable discount codes.
#[async_trait]
pub trait DiscountSource: Send + Sync {
    async fn list_active_codes(&self) -> Result<Vec<DiscountCode>>;
}

/// Fixed set of codes, typically read from the config file.
#[derive(Clone, Debug, Default)]
pub struct StaticDiscounts {
    pub codes: Vec<DiscountCode>,
}

impl StaticDiscounts {
    pub fn new(codes: Vec<DiscountCode>) -> Self {
        Self { codes }
    }
}

#[async_trait]
impl DiscountSource for StaticDiscounts {
    async fn list_active_codes(&self) -> Result<Vec<DiscountCode>> {
        let now = Utc::now();
        Ok(self
            .codes
            .iter()
            .filter(|code| code.is_active_at(now))
            .cloned()
            .collect())
    }
}

/// Discount source described by the config: the payment provider when a
/// secret key is set, the statically configured codes otherwise.
pub fn from_config(config: &Config) -> Box<dyn DiscountSource> {
    #[cfg(feature = "stripe")]
    {
        let secret = config.payments.stripe.active_secret();
        if !secret.is_empty() {
            return Box::new(stripe::Client::new(secret.to_string()));
        }
    }
    Box::new(StaticDiscounts::new(config.discounts.clone()))
}

#[cfg(feature = "stripe")]
impl From<stripe::Coupon> for DiscountCode {
    fn from(coupon: stripe::Coupon) -> Self {
        let currency = coupon.currency.map(|c| c.to_string());
        // Stripe amounts are expressed in the smallest currency unit.
        let scale = currency.as_deref().map_or(2, minor_units);
        DiscountCode {
            id: coupon.id.to_string(),
            percent_off: coupon.percent_off.and_then(Decimal::from_f64_retain),
            amount_off: coupon.amount_off.map(|amount| Decimal::new(amount, scale)),
            currency,
            name: coupon.name.unwrap_or_default(),
            expires_at: coupon
                .redeem_by
                .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0)),
        }
    }
}

/// Valid coupons defined with the payment provider.
#[cfg(feature = "stripe")]
#[async_trait]
impl DiscountSource for stripe::Client {
    async fn list_active_codes(&self) -> Result<Vec<DiscountCode>> {
        let mut params = stripe::ListCoupons::new();
        params.limit = Some(100);

        let mut codes = Vec::new();
        loop {
            let page = stripe::Coupon::list(self, &params).await?;
            let next = page
                .has_more
                .then(|| page.data.last().map(|coupon| coupon.id.clone()))
                .flatten();
            codes.extend(
                page.data
                    .into_iter()
                    .filter(|coupon| coupon.valid.unwrap_or(false))
                    .map(DiscountCode::from),
            );
            match next {
                Some(last) => params.starting_after = Some(last),
                None => break,
            }
        }
        tracing::debug!(count = codes.len(), "fetched active stripe coupons");
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use super::*;

    fn code(id: &str) -> DiscountCode {
        DiscountCode {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn summaries() {
        let percent = DiscountCode {
            percent_off: Some(dec!(20.0)),
            ..code("SPRING20")
        };
        assert_eq!(percent.summary(), "20% off");

        let fixed = DiscountCode {
            amount_off: Some(dec!(15)),
            currency: Some("usd".to_string()),
            ..code("FIFTEEN")
        };
        assert_eq!(fixed.summary(), "15.00 USD off");

        assert_eq!(code("MYSTERY").summary(), "Special offer");
    }

    #[test]
    fn zero_decimal_currencies() {
        assert_eq!(minor_units("JPY"), 0);
        assert_eq!(minor_units("krw"), 0);
        assert_eq!(minor_units("usd"), 2);

        let yen = DiscountCode {
            amount_off: Some(dec!(500)),
            currency: Some("jpy".to_string()),
            ..code("YEN500")
        };
        assert_eq!(yen.summary(), "500 JPY off");
    }

    #[cfg(feature = "stripe")]
    #[test]
    fn code_from_stripe_coupon() {
        let coupon = stripe::Coupon {
            id: "TOKYO500".parse().unwrap(),
            amount_off: Some(500),
            currency: Some(stripe::Currency::JPY),
            name: Some("Tokyo opening".to_string()),
            redeem_by: Some(1_783_166_400),
            valid: Some(true),
            ..Default::default()
        };
        let code = DiscountCode::from(coupon);
        assert_eq!(code.id, "TOKYO500");
        assert_eq!(code.amount_off, Some(dec!(500)));
        assert_eq!(code.currency.as_deref(), Some("jpy"));
        assert_eq!(code.name, "Tokyo opening");
        assert_eq!(
            code.expires_at,
            Some(Utc.with_ymd_and_hms(2026, 7, 4, 12, 0, 0).unwrap())
        );

        let coupon = stripe::Coupon {
            id: "SPRING20".parse().unwrap(),
            percent_off: Some(20.0),
            ..Default::default()
        };
        let code = DiscountCode::from(coupon);
        assert_eq!(code.percent_off, Some(dec!(20)));
        assert_eq!(code.amount_off, None);
        assert_eq!(code.summary(), "20% off");

        let coupon = stripe::Coupon {
            id: "FIVE".parse().unwrap(),
            amount_off: Some(550),
            currency: Some(stripe::Currency::USD),
            ..Default::default()
        };
        assert_eq!(DiscountCode::from(coupon).amount_off, Some(dec!(5.50)));
    }

    #[test]
    fn block_content_from_code() {
        let code = DiscountCode {
            percent_off: Some(dec!(25)),
            name: "Summer shred".to_string(),
            expires_at: Some(Utc.with_ymd_and_hms(2026, 7, 4, 12, 0, 0).unwrap()),
            ..code("SHRED25")
        };
        let content = code.to_content();
        assert_eq!(content.code, "SHRED25");
        assert_eq!(content.description, "Summer shred: 25% off");
        assert_eq!(content.expiry.as_deref(), Some("July 4, 2026"));
    }

    #[tokio::test]
    async fn static_source_skips_expired_codes() {
        let source = StaticDiscounts::new(vec![
            DiscountCode {
                expires_at: Some(Utc::now() - Duration::days(1)),
                ..code("OLD")
            },
            DiscountCode {
                expires_at: Some(Utc::now() + Duration::days(30)),
                ..code("NEW")
            },
            code("FOREVER"),
        ]);

        let active = source.list_active_codes().await.unwrap();
        let ids: Vec<_> = active.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["NEW", "FOREVER"]);
    }

    #[tokio::test]
    async fn config_without_secret_uses_static_codes() {
        let config = Config {
            discounts: vec![code("CONFIGURED")],
            ..Default::default()
        };
        let active = from_config(&config).list_active_codes().await.unwrap();
        assert_eq!(active, vec![code("CONFIGURED")]);
    }
}
