use crate::config::Contracts;
use crate::error::{Result, WorkflowError};
use crate::workflow::amount::{Range, RangeKind};
use crate::workflow::capability::Operation;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};

alloy_sol_types::sol! {
    // ERC20
    function balanceOf(address account) view returns (uint256);
    function allowance(address owner, address spender) view returns (uint256);
    function approve(address spender, uint256 value) returns (bool);
    function decimals() view returns (uint8);

    // Vault
    function depositEth() payable;
    function deposit(address token, uint256 amount);

    // Fee distributor
    function claimableFees(address account, uint256 firstBlock, uint256 lastBlock) view returns (uint256);
    function claimableAccruedFees(address account, uint256 firstAccrual, uint256 lastAccrual) view returns (uint256);
    function stagedFees(address account) view returns (uint256);
    function stageFees(uint256 firstBlock, uint256 lastBlock);
    function stageAccruedFees(uint256 firstAccrual, uint256 lastAccrual);
    function withdrawStagedFees();

    // Interest pool
    function releaseInterest(uint256 firstBlock, uint256 lastBlock);
    function releaseAccruedInterest(uint256 firstAccrual, uint256 lastAccrual);
}

/// A ready-to-sign contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
}

impl EncodedCall {
    fn new(to: Address, call: impl SolCall) -> Self {
        Self {
            to,
            data: Bytes::from(call.abi_encode()),
            value: None,
        }
    }
}

pub fn require_contract(address: Option<Address>, name: &str) -> Result<Address> {
    address.ok_or_else(|| WorkflowError::NotFound(format!("contracts.{name} is not configured")))
}

/// Encode a workflow operation into the contract call that performs it.
pub fn encode_operation(operation: &Operation, contracts: &Contracts) -> Result<EncodedCall> {
    match operation {
        Operation::Approve { currency, amount } => {
            let token = currency.token_address().ok_or_else(|| {
                WorkflowError::NotFound(format!("{} has no allowance to approve", currency.symbol))
            })?;
            let call = approveCall {
                spender: require_contract(contracts.vault, "vault")?,
                value: *amount,
            };
            Ok(EncodedCall::new(token, call))
        }
        Operation::Deposit { currency, amount } => {
            let vault = require_contract(contracts.vault, "vault")?;
            match currency.token_address() {
                None => Ok(EncodedCall {
                    value: Some(*amount),
                    ..EncodedCall::new(vault, depositEthCall {})
                }),
                Some(token) => Ok(EncodedCall::new(
                    vault,
                    depositCall {
                        token,
                        amount: *amount,
                    },
                )),
            }
        }
        Operation::StageFees { range } => {
            let distributor = require_contract(contracts.fee_distributor, "fee_distributor")?;
            let (first, last) = bounds(range);
            Ok(match range.kind {
                RangeKind::Blocks => EncodedCall::new(
                    distributor,
                    stageFeesCall {
                        firstBlock: first,
                        lastBlock: last,
                    },
                ),
                RangeKind::Accruals => EncodedCall::new(
                    distributor,
                    stageAccruedFeesCall {
                        firstAccrual: first,
                        lastAccrual: last,
                    },
                ),
            })
        }
        Operation::WithdrawFees => Ok(EncodedCall::new(
            require_contract(contracts.fee_distributor, "fee_distributor")?,
            withdrawStagedFeesCall {},
        )),
        Operation::ReleaseInterest { range } => {
            let pool = require_contract(contracts.interest_pool, "interest_pool")?;
            let (first, last) = bounds(range);
            Ok(match range.kind {
                RangeKind::Blocks => EncodedCall::new(
                    pool,
                    releaseInterestCall {
                        firstBlock: first,
                        lastBlock: last,
                    },
                ),
                RangeKind::Accruals => EncodedCall::new(
                    pool,
                    releaseAccruedInterestCall {
                        firstAccrual: first,
                        lastAccrual: last,
                    },
                ),
            })
        }
    }
}

fn bounds(range: &Range) -> (U256, U256) {
    (U256::from(range.first), U256::from(range.last))
}

pub fn encode_balance_of_call(owner: Address) -> Bytes {
    Bytes::from(balanceOfCall { account: owner }.abi_encode())
}

pub fn encode_allowance_call(owner: Address, spender: Address) -> Bytes {
    Bytes::from(allowanceCall { owner, spender }.abi_encode())
}

pub fn encode_decimals_call() -> Bytes {
    Bytes::from(decimalsCall {}.abi_encode())
}

pub fn encode_claimable_fees_call(owner: Address, range: &Range) -> Bytes {
    let (first, last) = bounds(range);
    match range.kind {
        RangeKind::Blocks => Bytes::from(
            claimableFeesCall {
                account: owner,
                firstBlock: first,
                lastBlock: last,
            }
            .abi_encode(),
        ),
        RangeKind::Accruals => Bytes::from(
            claimableAccruedFeesCall {
                account: owner,
                firstAccrual: first,
                lastAccrual: last,
            }
            .abi_encode(),
        ),
    }
}

pub fn encode_staged_fees_call(owner: Address) -> Bytes {
    Bytes::from(stagedFeesCall { account: owner }.abi_encode())
}

pub fn decode_u256(data: &Bytes) -> Result<U256> {
    let value: (U256,) = <(U256,)>::abi_decode(data)
        .map_err(|err| WorkflowError::Transport(format!("invalid uint256 return data: {err}")))?;
    Ok(value.0)
}

pub fn decode_decimals(data: &Bytes) -> Result<u8> {
    let value = decode_u256(data)?;
    u8::try_from(value)
        .map_err(|_| WorkflowError::Transport(format!("decimals out of range: {value}")))
}
