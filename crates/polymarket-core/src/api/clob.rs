//! CLOB Order Gateway HTTP client (C3, §4.3).
//!
//! Pure REST: order post/cancel/status, open-orders, midpoint. L2 requests
//! are authenticated with an HMAC-SHA256 signature over
//! `{timestamp}{method}{path}{body}`, matching the venue's documented
//! scheme; the signing key material is the same EOA key the order itself is
//! signed with (§6, §4.3.1).

use crate::chain::addresses::Addresses;
use crate::signing::{OrderSide as SigOrderSide, OrderSigner, SignedOrder};
use crate::types::order::{
    Order, OrderSide, OrderStatusResult, PostLimitResult, PostMarketResult, TimeInForce,
};
use crate::{Error, Result};
use alloy_primitives::U256;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;

/// L2 API credentials, auto-derived from the signing key on first run via
/// `OrderSigner::sign_clob_auth_message` when not supplied in config.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub api_passphrase: String,
}

pub struct ClobClient {
    base_url: String,
    http: reqwest::Client,
    creds: Option<ApiCredentials>,
    signer: OrderSigner,
}

impl ClobClient {
    pub fn new(base_url: String, creds: Option<ApiCredentials>, signer: OrderSigner) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
            creds,
            signer,
        }
    }

    /// Derive L2 API credentials from the signing key, per the venue's
    /// one-time key-derivation handshake (§4.3.1).
    pub async fn derive_credentials(
        base_url: &str,
        signer: &OrderSigner,
    ) -> Result<ApiCredentials> {
        let timestamp = now_secs();
        let nonce = 0u64;
        let signature = signer
            .sign_clob_auth_message(timestamp, nonce)
            .await
            .map_err(|e| Error::Api {
                message: format!("failed to sign CLOB auth message: {e}"),
                status: None,
            })?;

        let http = reqwest::Client::new();
        let response = http
            .get(format!("{base_url}/auth/derive-api-key"))
            .header("POLY_ADDRESS", format!("{:?}", signer.address()))
            .header("POLY_SIGNATURE", signature)
            .header("POLY_TIMESTAMP", timestamp.to_string())
            .header("POLY_NONCE", nonce.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("derive-api-key failed: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }

        let body: DerivedKeyResponse = response.json().await?;
        Ok(ApiCredentials {
            api_key: body.api_key,
            api_secret: body.secret,
            api_passphrase: body.passphrase,
        })
    }

    fn l2_headers(&self, method: &str, path: &str, body: &str) -> Result<Vec<(String, String)>> {
        let creds = self.creds.as_ref().ok_or_else(|| Error::Api {
            message: "CLOB client has no L2 credentials configured".to_string(),
            status: None,
        })?;

        let timestamp = now_secs();
        let message = format!("{timestamp}{method}{path}{body}");

        let key_bytes = base64::decode(&creds.api_secret).map_err(|e| Error::Api {
            message: format!("invalid base64 API secret: {e}"),
            status: None,
        })?;
        let mut mac = Hmac::<Sha256>::new_from_slice(&key_bytes).map_err(|e| Error::Api {
            message: format!("invalid HMAC key: {e}"),
            status: None,
        })?;
        mac.update(message.as_bytes());
        let signature = base64::encode(mac.finalize().into_bytes());

        Ok(vec![
            ("POLY_API_KEY".to_string(), creds.api_key.clone()),
            ("POLY_PASSPHRASE".to_string(), creds.api_passphrase.clone()),
            ("POLY_TIMESTAMP".to_string(), timestamp.to_string()),
            ("POLY_SIGNATURE".to_string(), signature),
        ])
    }

    /// Build, sign (EIP-712), and POST a limit order. The verifying contract
    /// is picked from `addresses` by `neg_risk` so the signature matches the
    /// exchange the venue actually routes this market to (§4.3.1).
    pub async fn post_limit(
        &self,
        token_id: U256,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
        addresses: &Addresses,
        neg_risk: bool,
        tif: TimeInForce,
    ) -> Result<PostLimitResult> {
        let path = "/order";
        let order_type = match tif {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Fok => "FOK",
            TimeInForce::Fak => "FAK",
        };
        let signed = self
            .build_and_sign_order(token_id, side, price, size, addresses, neg_risk, tif)
            .await?;
        let body = self.order_request_body(&signed, order_type)?;

        let headers = self.l2_headers("POST", path, &body)?;
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .body(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("post_limit rejected: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }
        let parsed: PostOrderResponse = response.json().await?;
        Ok(PostLimitResult {
            ok: parsed.success,
            order_id: parsed.order_id.unwrap_or_default(),
        })
    }

    /// Build, sign, and POST a market order. `amount` is in collateral units
    /// for BUY, shares for SELL; `worst_price` is the signed order's limit
    /// guard (§4.3).
    pub async fn post_market(
        &self,
        token_id: U256,
        side: OrderSide,
        amount: Decimal,
        worst_price: Decimal,
        addresses: &Addresses,
        neg_risk: bool,
        tif: TimeInForce,
    ) -> Result<PostMarketResult> {
        let path = "/order";
        let order_type = match tif {
            TimeInForce::Fok => "FOK",
            TimeInForce::Fak => "FAK",
            TimeInForce::Gtc => "FAK",
        };
        let signed = self
            .build_and_sign_order(token_id, side, worst_price, amount, addresses, neg_risk, tif)
            .await?;
        let body = self.order_request_body(&signed, order_type)?;

        let headers = self.l2_headers("POST", path, &body)?;
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .body(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("post_market rejected: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }
        let parsed: PostMarketResponse = response.json().await?;
        Ok(PostMarketResult {
            ok: parsed.success,
            fill_price: parsed.price.unwrap_or(Decimal::ZERO),
            taking_amount: parsed.taking_amount.unwrap_or(Decimal::ZERO),
            making_amount: parsed.making_amount.unwrap_or(Decimal::ZERO),
        })
    }

    /// Build an `OrderData` via the maker's `OrderBuilder` and sign it
    /// against the exchange contract selected by `neg_risk`. GTC orders
    /// carry no expiration (`0`); FOK/FAK are expected to clear immediately
    /// so a short expiry bounds how long a stuck one can rest.
    async fn build_and_sign_order(
        &self,
        token_id: U256,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
        addresses: &Addresses,
        neg_risk: bool,
        tif: TimeInForce,
    ) -> Result<SignedOrder> {
        let signer = self.signer.for_exchange(addresses.exchange_for(neg_risk));
        let builder = signer
            .order_builder()
            .token_id(token_id)
            .side(to_sig_side(side))
            .price(price)
            .size(size);
        let builder = match tif {
            TimeInForce::Gtc => builder.expires_at(0),
            TimeInForce::Fok | TimeInForce::Fak => builder.expires_in(60),
        };
        let order = builder.build().ok_or_else(|| Error::Api {
            message: "failed to build order: missing required fields".to_string(),
            status: None,
        })?;

        signer.sign_order(&order).await.map_err(|e| Error::Api {
            message: format!("failed to sign order: {e}"),
            status: None,
        })
    }

    /// Signed order fields flattened into the CLOB's expected POST body,
    /// with `orderType` and the API key `owner` layered on top.
    fn order_request_body(&self, signed: &SignedOrder, order_type: &str) -> Result<String> {
        let mut value = serde_json::to_value(signed).map_err(|e| Error::Api {
            message: format!("failed to serialize signed order: {e}"),
            status: None,
        })?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "orderType".to_string(),
                serde_json::Value::String(order_type.to_string()),
            );
            if let Some(creds) = &self.creds {
                map.insert(
                    "owner".to_string(),
                    serde_json::Value::String(creds.api_key.clone()),
                );
            }
        }
        Ok(value.to_string())
    }

    /// Cancelling an unknown or already-settled order is a success (§4.3).
    pub async fn cancel(&self, order_id: &str) -> Result<()> {
        let path = format!("/order/{order_id}");
        let headers = self.l2_headers("DELETE", &path, "")?;
        let mut request = self.http.delete(format!("{}{}", self.base_url, path));
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await?;
        if response.status().is_success() || response.status().as_u16() == 404 {
            return Ok(());
        }
        Err(Error::Api {
            message: format!("cancel failed: HTTP {}", response.status()),
            status: Some(response.status().as_u16()),
        })
    }

    pub async fn open_orders(&self, asset_id: Option<&str>) -> Result<Vec<Order>> {
        let path = match asset_id {
            Some(id) => format!("/orders?asset_id={id}"),
            None => "/orders".to_string(),
        };
        let headers = self.l2_headers("GET", &path, "")?;
        let mut request = self.http.get(format!("{}{}", self.base_url, path));
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("open_orders failed: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }
        Ok(response.json().await?)
    }

    pub async fn order_status(&self, order_id: &str) -> Result<OrderStatusResult> {
        let path = format!("/order/{order_id}");
        let headers = self.l2_headers("GET", &path, "")?;
        let mut request = self.http.get(format!("{}{}", self.base_url, path));
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("order_status failed: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }
        Ok(response.json().await?)
    }

    pub async fn midpoint(&self, token_id: U256) -> Result<Decimal> {
        let response = self
            .http
            .get(format!(
                "{}/midpoint?token_id={}",
                self.base_url, token_id
            ))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("midpoint failed: HTTP {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }
        let body: MidpointResponse = response.json().await?;
        Decimal::from_str_exact(&body.mid).map_err(|e| Error::Api {
            message: format!("malformed midpoint {:?}: {e}", body.mid),
            status: None,
        })
    }
}

fn to_sig_side(side: OrderSide) -> SigOrderSide {
    match side {
        OrderSide::Buy => SigOrderSide::Buy,
        OrderSide::Sell => SigOrderSide::Sell,
    }
}

fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[derive(Debug, Deserialize)]
struct DerivedKeyResponse {
    #[serde(rename = "apiKey")]
    api_key: String,
    secret: String,
    passphrase: String,
}

#[derive(Debug, Deserialize)]
struct PostOrderResponse {
    success: bool,
    #[serde(rename = "orderID")]
    order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMarketResponse {
    success: bool,
    price: Option<Decimal>,
    #[serde(rename = "takingAmount")]
    taking_amount: Option<Decimal>,
    #[serde(rename = "makingAmount")]
    making_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct MidpointResponse {
    mid: String,
}
