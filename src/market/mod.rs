//! Flat Black-Scholes market inputs.
//!
//! Term structures and quote plumbing live outside this crate; engines only read the
//! scalars collected here.

use crate::core::FdError;

/// Market snapshot used by pricing engines.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Market {
    /// Spot price.
    pub spot: f64,
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Continuously compounded dividend yield.
    pub dividend_yield: f64,
    /// Flat Black volatility.
    pub vol: f64,
}

impl Market {
    /// Starts a market builder.
    #[inline]
    pub fn builder() -> MarketBuilder {
        MarketBuilder::default()
    }
}

/// Builder for [`Market`].
#[derive(Debug, Clone, Default)]
pub struct MarketBuilder {
    spot: Option<f64>,
    rate: Option<f64>,
    dividend_yield: Option<f64>,
    flat_vol: Option<f64>,
}

impl MarketBuilder {
    /// Sets the spot price.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets the flat risk-free rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Sets the continuous dividend yield.
    #[inline]
    pub fn dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }

    /// Sets the flat volatility.
    #[inline]
    pub fn flat_vol(mut self, vol: f64) -> Self {
        self.flat_vol = Some(vol);
        self
    }

    /// Validates and builds a [`Market`].
    pub fn build(self) -> Result<Market, FdError> {
        let spot = self
            .spot
            .ok_or_else(|| FdError::InvalidInput("market spot is required".to_string()))?;
        if spot <= 0.0 || !spot.is_finite() {
            return Err(FdError::InvalidInput(
                "market spot must be finite and > 0".to_string(),
            ));
        }

        let rate = self.rate.unwrap_or(0.0);
        let dividend_yield = self.dividend_yield.unwrap_or(0.0);
        if !rate.is_finite() || !dividend_yield.is_finite() {
            return Err(FdError::InvalidInput(
                "market rate and dividend yield must be finite".to_string(),
            ));
        }

        let vol = self.flat_vol.ok_or_else(|| {
            FdError::InvalidInput("market flat_vol is required".to_string())
        })?;
        if vol <= 0.0 || !vol.is_finite() {
            return Err(FdError::InvalidInput(
                "market flat_vol must be finite and > 0".to_string(),
            ));
        }

        Ok(Market {
            spot,
            rate,
            dividend_yield,
            vol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_rates_and_requires_spot_and_vol() {
        let market = Market::builder().spot(100.0).flat_vol(0.2).build().unwrap();
        assert_eq!(market.rate, 0.0);
        assert_eq!(market.dividend_yield, 0.0);
        assert!(Market::builder().flat_vol(0.2).build().is_err());
        assert!(Market::builder().spot(100.0).build().is_err());
        assert!(Market::builder().spot(-1.0).flat_vol(0.2).build().is_err());
        assert!(Market::builder().spot(100.0).flat_vol(0.0).build().is_err());
    }
}
