//! Raw calldata encoders for the contracts C2 (CTF Primitives) and C1
//! (Wallet-Tx Serializer) call through.
//!
//! The ERC-20/ERC-1155 approval encoders keep the source's hand-rolled
//! selector-and-left-pad style (narrow, fixed, easy to eyeball). The CTF
//! split/merge/redeem calls use `alloy_sol_types::sol!` instead, since their
//! argument lists include a dynamic `uint256[]` whose offset-based ABI
//! encoding is exactly what that macro exists to get right.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

/// ERC-20 `approve(address,uint256)` selector.
const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// ERC-20 `allowance(address,address)` selector.
const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// ERC-1155 `setApprovalForAll(address,bool)` selector.
const SET_APPROVAL_SELECTOR: [u8; 4] = [0xa2, 0x2c, 0xb4, 0x65];

/// ERC-1155 `isApprovedForAll(address,address)` selector.
const IS_APPROVED_FOR_ALL_SELECTOR: [u8; 4] = [0xe9, 0x85, 0xe9, 0xc5];

/// ERC-20 `balanceOf(address)` selector.
const ERC20_BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Max uint256, used for "unlimited" ERC-20 approvals.
const MAX_UINT256: U256 = U256::MAX;

fn left_pad_address(addr: Address, out: &mut Vec<u8>) {
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(addr.as_slice());
}

/// `approve(spender, MAX_UINT256)`.
pub fn encode_approve(spender: Address) -> Bytes {
    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&APPROVE_SELECTOR);
    left_pad_address(spender, &mut data);
    data.extend_from_slice(&MAX_UINT256.to_be_bytes::<32>());
    Bytes::from(data)
}

/// `allowance(owner, spender)`.
pub fn encode_allowance(owner: Address, spender: Address) -> Bytes {
    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&ALLOWANCE_SELECTOR);
    left_pad_address(owner, &mut data);
    left_pad_address(spender, &mut data);
    Bytes::from(data)
}

/// `setApprovalForAll(operator, true)`.
pub fn encode_set_approval_for_all(operator: Address) -> Bytes {
    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&SET_APPROVAL_SELECTOR);
    left_pad_address(operator, &mut data);
    data.extend_from_slice(&[0u8; 31]);
    data.push(1);
    Bytes::from(data)
}

/// `isApprovedForAll(owner, operator)`.
pub fn encode_is_approved_for_all(owner: Address, operator: Address) -> Bytes {
    let mut data = Vec::with_capacity(68);
    data.extend_from_slice(&IS_APPROVED_FOR_ALL_SELECTOR);
    left_pad_address(owner, &mut data);
    left_pad_address(operator, &mut data);
    Bytes::from(data)
}

/// `balanceOf(owner)` on the USDC collateral token (§4.5 step 1's
/// collateral-sufficiency check).
pub fn encode_erc20_balance_of(owner: Address) -> Bytes {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&ERC20_BALANCE_OF_SELECTOR);
    left_pad_address(owner, &mut data);
    Bytes::from(data)
}

sol! {
    interface IConditionalTokens {
        function splitPosition(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] calldata partition, uint256 amount) external;
        function mergePositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] calldata partition, uint256 amount) external;
        function redeemPositions(address collateralToken, bytes32 parentCollectionId, bytes32 conditionId, uint256[] calldata indexSets) external;
        function balanceOf(address owner, uint256 id) external view returns (uint256);
        function payoutDenominator(bytes32 conditionId) external view returns (uint256);
        function payoutNumerators(bytes32 conditionId, uint256 index) external view returns (uint256);
    }
}

/// Binary markets split across the two outcome slots: index sets `1` (binary
/// 01) and `2` (binary 10).
pub const BINARY_PARTITION: [u64; 2] = [1, 2];

use alloy_primitives::B256;

pub fn encode_split_position(
    collateral: Address,
    condition_id: B256,
    amount: U256,
) -> Bytes {
    let call = IConditionalTokens::splitPositionCall {
        collateralToken: collateral,
        parentCollectionId: B256::ZERO,
        conditionId: condition_id,
        partition: BINARY_PARTITION.iter().map(|&i| U256::from(i)).collect(),
        amount,
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_merge_positions(
    collateral: Address,
    condition_id: B256,
    amount: U256,
) -> Bytes {
    let call = IConditionalTokens::mergePositionsCall {
        collateralToken: collateral,
        parentCollectionId: B256::ZERO,
        conditionId: condition_id,
        partition: BINARY_PARTITION.iter().map(|&i| U256::from(i)).collect(),
        amount,
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_redeem_positions(collateral: Address, condition_id: B256) -> Bytes {
    let call = IConditionalTokens::redeemPositionsCall {
        collateralToken: collateral,
        parentCollectionId: B256::ZERO,
        conditionId: condition_id,
        indexSets: BINARY_PARTITION.iter().map(|&i| U256::from(i)).collect(),
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_balance_of(owner: Address, token_id: U256) -> Bytes {
    Bytes::from(IConditionalTokens::balanceOfCall { owner, id: token_id }.abi_encode())
}

pub fn encode_payout_denominator(condition_id: B256) -> Bytes {
    Bytes::from(
        IConditionalTokens::payoutDenominatorCall {
            conditionId: condition_id,
        }
        .abi_encode(),
    )
}

pub fn encode_payout_numerator(condition_id: B256, outcome_idx: u64) -> Bytes {
    Bytes::from(
        IConditionalTokens::payoutNumeratorsCall {
            conditionId: condition_id,
            index: U256::from(outcome_idx),
        }
        .abi_encode(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_approve_has_selector_and_length() {
        let spender = Address::ZERO;
        let data = encode_approve(spender);
        assert_eq!(&data[0..4], &APPROVE_SELECTOR);
        assert_eq!(data.len(), 68);
    }

    #[test]
    fn test_encode_split_position_roundtrips_selector() {
        let data = encode_split_position(Address::ZERO, B256::ZERO, U256::from(5_000_000u64));
        assert_eq!(
            &data[0..4],
            &IConditionalTokens::splitPositionCall::SELECTOR
        );
    }

    #[test]
    fn test_encode_set_approval_for_all_sets_true() {
        let data = encode_set_approval_for_all(Address::ZERO);
        assert_eq!(data.last().copied(), Some(1u8));
    }
}
