//! Canonical text rendering of manifests.
//!
//! ```text
//! CALL_METHOD
//!     Address("account_tdx_2_1...")
//!     "lock_fee"
//!     Decimal("10")
//! ;
//! ```
//!
//! Used for debug logs and the CLI. Blobs are summarised by size, never
//! dumped.

use std::fmt;

use super::instruction::Instruction;
use super::value::{Expression, ManifestValue};
use super::{ManifestInstructions, TransactionManifest};

const INDENT: &str = "    ";

impl fmt::Display for ManifestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestValue::Bool(b) => write!(f, "{b}"),
            ManifestValue::U8(n) => write!(f, "{n}u8"),
            ManifestValue::U32(n) => write!(f, "{n}u32"),
            ManifestValue::U64(n) => write!(f, "{n}u64"),
            ManifestValue::String(s) => write!(f, "{s:?}"),
            ManifestValue::Decimal(d) => write!(f, "Decimal(\"{d}\")"),
            ManifestValue::Address(a) => write!(f, "Address(\"{a}\")"),
            ManifestValue::Bucket(b) => write!(f, "{b}"),
            ManifestValue::Enum {
                discriminator,
                fields,
            } => {
                write!(f, "Enum<{discriminator}u8>(")?;
                write_list(f, fields)?;
                f.write_str(")")
            }
            ManifestValue::Tuple(fields) => {
                f.write_str("Tuple(")?;
                write_list(f, fields)?;
                f.write_str(")")
            }
            ManifestValue::Array(items) => {
                f.write_str("Array(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            ManifestValue::NonFungibleLocalId(id) => write!(f, "NonFungibleLocalId(\"{id}\")"),
            ManifestValue::Expression(Expression::EntireWorktop) => {
                f.write_str("Expression(\"ENTIRE_WORKTOP\")")
            }
            ManifestValue::Blob(blob) => write!(f, "Blob(\"{}\")", hex::encode(blob.0)),
            ManifestValue::PublicKeyHash(h) => write!(f, "PublicKeyHash(\"{}\")", h.to_hex()),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[ManifestValue]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

fn write_instruction(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    operands: &[String],
) -> fmt::Result {
    writeln!(f, "{name}")?;
    for operand in operands {
        writeln!(f, "{INDENT}{operand}")?;
    }
    writeln!(f, ";")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = |a: &super::address::Address| format!("Address(\"{a}\")");
        match self {
            Instruction::TakeFromWorktop {
                resource,
                amount,
                new_bucket,
            } => write_instruction(
                f,
                "TAKE_FROM_WORKTOP",
                &[
                    addr(resource),
                    format!("Decimal(\"{amount}\")"),
                    new_bucket.to_string(),
                ],
            ),
            Instruction::TakeNonFungiblesFromWorktop {
                resource,
                ids,
                new_bucket,
            } => {
                let ids = ids
                    .iter()
                    .map(|id| format!("NonFungibleLocalId(\"{id}\")"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write_instruction(
                    f,
                    "TAKE_NON_FUNGIBLES_FROM_WORKTOP",
                    &[
                        addr(resource),
                        format!("Array<NonFungibleLocalId>({ids})"),
                        new_bucket.to_string(),
                    ],
                )
            }
            Instruction::TakeAllFromWorktop {
                resource,
                new_bucket,
            } => write_instruction(
                f,
                "TAKE_ALL_FROM_WORKTOP",
                &[addr(resource), new_bucket.to_string()],
            ),
            Instruction::AssertWorktopContains { resource, amount } => write_instruction(
                f,
                "ASSERT_WORKTOP_CONTAINS",
                &[addr(resource), format!("Decimal(\"{amount}\")")],
            ),
            Instruction::CallFunction {
                package,
                blueprint,
                function,
                args,
            } => {
                let mut operands = vec![
                    addr(package),
                    format!("{blueprint:?}"),
                    format!("{function:?}"),
                ];
                operands.extend(args.iter().map(ToString::to_string));
                write_instruction(f, "CALL_FUNCTION", &operands)
            }
            Instruction::CallMethod {
                address,
                method,
                args,
            } => {
                let mut operands = vec![addr(address), format!("{method:?}")];
                operands.extend(args.iter().map(ToString::to_string));
                write_instruction(f, "CALL_METHOD", &operands)
            }
            Instruction::MetadataSet {
                address,
                key,
                value,
            } => write_instruction(
                f,
                "SET_METADATA",
                &[addr(address), format!("{key:?}"), value.to_string()],
            ),
        }
    }
}

impl fmt::Display for TransactionManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instructions() {
            ManifestInstructions::Structured(list) => {
                for instruction in list {
                    write!(f, "{instruction}")?;
                }
            }
            ManifestInstructions::Opaque(text) => {
                f.write_str(text)?;
                if !text.ends_with('\n') {
                    f.write_str("\n")?;
                }
            }
        }

        if !self.blobs().is_empty() {
            writeln!(f, "BLOBS")?;
            for (index, blob) in self.blobs().iter().enumerate() {
                writeln!(f, "BLOB[{index}]: #{} bytes", blob.len())?;
            }
        }
        Ok(())
    }
}
