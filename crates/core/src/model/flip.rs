use crate::rlp::{self, DecodeError, Rlp};

/// Per-slot ranked position indices recovered from a flip payload.
///
/// A slot whose inner entry carried no value reads as position 0; an explicit zero
/// and a missing value are indistinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlipOrder(Vec<Vec<u64>>);

impl FlipOrder {
    #[must_use]
    pub fn new(slots: Vec<Vec<u64>>) -> Self {
        Self(slots)
    }

    #[must_use]
    pub fn slots(&self) -> &[Vec<u64>] {
        &self.0
    }

    /// The first ranked position of every slot, 0 for empty slots.
    #[must_use]
    pub fn leading_positions(&self) -> Vec<u64> {
        self.0
            .iter()
            .map(|slot| slot.first().copied().unwrap_or(0))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_rlp(orders: &Rlp) -> Result<Self, DecodeError> {
        let slots = orders
            .as_list()
            .ok_or(DecodeError::UnexpectedShape("orders must be a list"))?;
        let mut decoded = Vec::with_capacity(slots.len());
        for slot in slots {
            let entries = slot
                .as_list()
                .ok_or(DecodeError::UnexpectedShape("order slot must be a list"))?;
            let mut positions = Vec::with_capacity(entries.len());
            for entry in entries {
                let values = entry
                    .as_list()
                    .ok_or(DecodeError::UnexpectedShape("order entry must be a list"))?;
                let position = match values.first() {
                    Some(value) => value.as_u64()?,
                    None => 0,
                };
                positions.push(position);
            }
            decoded.push(positions);
        }
        Ok(Self(decoded))
    }
}

/// A flip payload decoded into its displayable content and shuffle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFlip {
    content: Rlp,
    order: FlipOrder,
}

impl DecodedFlip {
    #[must_use]
    pub fn new(content: Rlp, order: FlipOrder) -> Self {
        Self { content, order }
    }

    /// Decode a raw flip payload: a list whose first element is the content and
    /// whose second element holds the orders.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` for malformed RLP or an unexpected payload shape.
    pub fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let root = rlp::decode(payload)?;
        let Some([content, orders, ..]) = root.as_list() else {
            return Err(DecodeError::UnexpectedShape(
                "flip payload must be a list of content and orders",
            ));
        };
        Ok(Self {
            content: content.clone(),
            order: FlipOrder::from_rlp(orders)?,
        })
    }

    #[must_use]
    pub fn content(&self) -> &Rlp {
        &self.content
    }

    #[must_use]
    pub fn order(&self) -> &FlipOrder {
        &self.order
    }

    /// Image blobs carried by the content, in stored order.
    pub fn images(&self) -> impl Iterator<Item = &[u8]> {
        self.content
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Rlp::as_bytes)
    }

    /// Re-encode into the payload layout accepted by `from_payload`.
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let orders = Rlp::list(self.order.slots().iter().map(|slot| {
            Rlp::list(
                slot.iter()
                    .map(|position| Rlp::list([Rlp::uint(*position)])),
            )
        }));
        rlp::encode(&Rlp::list([self.content.clone(), orders]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> Vec<u8> {
        let blob = Rlp::bytes(*b"blob");
        let orders = Rlp::list([
            Rlp::list([Rlp::list([Rlp::uint(3)])]),
            Rlp::list([Rlp::List(Vec::new())]),
            Rlp::list([Rlp::list([Rlp::uint(1)])]),
        ]);
        rlp::encode(&Rlp::list([blob, orders]))
    }

    #[test]
    fn decodes_content_and_defaults_missing_positions() {
        let flip = DecodedFlip::from_payload(&sample_payload()).unwrap();
        assert_eq!(flip.content(), &Rlp::bytes(*b"blob"));
        assert_eq!(flip.order().slots(), &[vec![3_u64], vec![0], vec![1]]);
        assert_eq!(flip.order().leading_positions(), vec![3_u64, 0, 1]);
    }

    #[test]
    fn ranked_slots_keep_every_entry() {
        let orders = FlipOrder::new(vec![vec![2, 0, 1, 3], vec![], vec![1, 2, 3, 0]]);
        let flip = DecodedFlip::new(Rlp::list([Rlp::bytes([0xff_u8, 0xd8])]), orders.clone());
        let decoded = DecodedFlip::from_payload(&flip.to_payload()).unwrap();
        assert_eq!(decoded.order(), &orders);
        assert_eq!(decoded.order().leading_positions(), vec![2, 0, 1]);
    }

    #[test]
    fn images_lists_content_blobs() {
        let content = Rlp::list([Rlp::bytes([1_u8, 2, 3]), Rlp::bytes([4_u8, 5])]);
        let flip = DecodedFlip::new(content, FlipOrder::default());
        let images: Vec<&[u8]> = flip.images().collect();
        assert_eq!(images, vec![&[1_u8, 2, 3][..], &[4_u8, 5][..]]);
    }

    #[test]
    fn single_element_payload_is_rejected() {
        let payload = rlp::encode(&Rlp::list([Rlp::bytes(*b"blob")]));
        assert!(matches!(
            DecodedFlip::from_payload(&payload),
            Err(DecodeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn scalar_order_entry_is_rejected() {
        let payload = rlp::encode(&Rlp::list([
            Rlp::bytes(*b"blob"),
            Rlp::list([Rlp::list([Rlp::uint(3)])]),
        ]));
        assert!(matches!(
            DecodedFlip::from_payload(&payload),
            Err(DecodeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut payload = sample_payload();
        payload.pop();
        assert!(DecodedFlip::from_payload(&payload).is_err());
    }
}
