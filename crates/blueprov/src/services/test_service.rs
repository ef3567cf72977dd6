//! Test service
//!
//! Exercises the flag variants a peer application may meet: plain,
//! encrypted and secure-connection read/write, static descriptors, and a
//! Characteristic User Description that is writable only when its owner
//! declares `writable-auxiliaries`.

use crate::error::{GattError, GattResult};
use crate::gatt::{
    Access, AttributeTree, CharacteristicContext, CharacteristicHandler, DescriptorContext,
    DescriptorHandler, Flags, Options, ServiceId, TreeResult,
};
use crate::uuid::Uuid;
use tracing::info;

pub const TEST_SVC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef0);
pub const TEST_CHRC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef1);
pub const TEST_DESC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef2);
pub const TEST_ENCRYPT_CHRC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef3);
pub const TEST_ENCRYPT_DESC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef4);
pub const TEST_SECURE_CHRC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef5);
pub const TEST_SECURE_DESC_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef6);
/// Characteristic User Description
pub const CUD_UUID: Uuid = Uuid::from_u16(0x2901);

const CUD_TEXT: &str = "This is a characteristic for testing";

/// Stores whatever the peer writes and returns it on read.
pub struct BytesCharacteristic {
    label: &'static str,
}

impl CharacteristicHandler for BytesCharacteristic {
    fn read_value(
        &mut self,
        ctx: &mut CharacteristicContext<'_>,
        _options: &Options,
    ) -> GattResult<Vec<u8>> {
        ctx.require(Access::Read)?;
        info!(value = ?ctx.value(), "{} Read", self.label);
        Ok(ctx.value().to_vec())
    }

    fn write_value(
        &mut self,
        ctx: &mut CharacteristicContext<'_>,
        value: &[u8],
        _options: &Options,
    ) -> GattResult<()> {
        ctx.require(Access::Write)?;
        info!(?value, "{} Write", self.label);
        ctx.set_value(value.to_vec());
        Ok(())
    }
}

/// Always reads `Test`; writes fall through to the default.
pub struct StaticDescriptor;

impl DescriptorHandler for StaticDescriptor {
    fn init(&mut self, ctx: &mut DescriptorContext<'_>) {
        ctx.set_value(b"Test".to_vec());
    }

    fn read_value(
        &mut self,
        ctx: &mut DescriptorContext<'_>,
        _options: &Options,
    ) -> GattResult<Vec<u8>> {
        ctx.require(Access::Read)?;
        Ok(ctx.value().to_vec())
    }
}

pub struct UserDescriptionDescriptor;

impl DescriptorHandler for UserDescriptionDescriptor {
    fn init(&mut self, ctx: &mut DescriptorContext<'_>) {
        ctx.set_value(CUD_TEXT.as_bytes().to_vec());
    }

    fn read_value(
        &mut self,
        ctx: &mut DescriptorContext<'_>,
        _options: &Options,
    ) -> GattResult<Vec<u8>> {
        Ok(ctx.value().to_vec())
    }

    fn write_value(
        &mut self,
        ctx: &mut DescriptorContext<'_>,
        value: &[u8],
        _options: &Options,
    ) -> GattResult<()> {
        if !ctx.owner_flags().contains(Flags::WRITABLE_AUXILIARIES) {
            return Err(GattError::NotPermitted);
        }
        ctx.set_value(value.to_vec());
        Ok(())
    }
}

/// Mounts the test service at `index`.
pub fn register_test_service(tree: &mut AttributeTree, index: u16) -> TreeResult<ServiceId> {
    let service = tree.add_service(index, TEST_SVC_UUID, true)?;
    let cud_flags = Flags::READ | Flags::WRITE;

    let plain = tree.add_characteristic(
        service,
        0,
        TEST_CHRC_UUID,
        Flags::READ | Flags::WRITE | Flags::WRITABLE_AUXILIARIES,
        BytesCharacteristic {
            label: "TestCharacteristic",
        },
    )?;
    tree.add_descriptor(plain, 0, TEST_DESC_UUID, Flags::READ | Flags::WRITE, StaticDescriptor)?;
    tree.add_descriptor(plain, 1, CUD_UUID, cud_flags, UserDescriptionDescriptor)?;

    let encrypted = tree.add_characteristic(
        service,
        1,
        TEST_ENCRYPT_CHRC_UUID,
        Flags::ENCRYPT_READ | Flags::ENCRYPT_WRITE,
        BytesCharacteristic {
            label: "TestEncryptCharacteristic",
        },
    )?;
    tree.add_descriptor(
        encrypted,
        2,
        TEST_ENCRYPT_DESC_UUID,
        Flags::ENCRYPT_READ | Flags::ENCRYPT_WRITE,
        StaticDescriptor,
    )?;
    tree.add_descriptor(encrypted, 3, CUD_UUID, cud_flags, UserDescriptionDescriptor)?;

    let secure = tree.add_characteristic(
        service,
        2,
        TEST_SECURE_CHRC_UUID,
        Flags::SECURE_READ | Flags::SECURE_WRITE,
        BytesCharacteristic {
            label: "TestSecureCharacteristic",
        },
    )?;
    tree.add_descriptor(
        secure,
        2,
        TEST_SECURE_DESC_UUID,
        Flags::SECURE_READ | Flags::SECURE_WRITE,
        StaticDescriptor,
    )?;
    tree.add_descriptor(secure, 3, CUD_UUID, cud_flags, UserDescriptionDescriptor)?;

    Ok(service)
}
