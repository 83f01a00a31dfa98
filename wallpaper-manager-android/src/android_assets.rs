use anyhow::{Context, Result};
use jni::objects::{GlobalRef, JByteArray, JObject, JValue};
use jni::JavaVM;

use wallpaper_manager_core::AssetResolver;

use crate::android_wallpaper::{clear_exception, AndroidWallpaperService};

const READ_CHUNK: i32 = 16 * 1024;

/// Reads packaged assets through `Context.getAssets()`.
pub struct AndroidAssetResolver {
    vm: JavaVM,
    context: GlobalRef,
}

impl AndroidAssetResolver {
    pub fn new(service: &AndroidWallpaperService) -> Result<Self> {
        let vm = unsafe { JavaVM::from_raw(service.vm().get_java_vm_pointer()) }
            .context("Failed to share JavaVM handle")?;
        Ok(Self { vm, context: service.context().clone() })
    }
}

impl AssetResolver for AndroidAssetResolver {
    fn open(&self, key: &str) -> Result<Vec<u8>> {
        let mut env = self.vm.attach_current_thread().context("Failed to attach current thread")?;
        let result = (|| -> Result<Vec<u8>> {
            let assets = env
                .call_method(self.context.as_obj(), "getAssets", "()Landroid/content/res/AssetManager;", &[])
                .context("Failed to get AssetManager")?
                .l()?;
            let name = JObject::from(env.new_string(key)?);
            let input = env
                .call_method(&assets, "open", "(Ljava/lang/String;)Ljava/io/InputStream;", &[JValue::Object(&name)])
                .with_context(|| format!("AssetManager.open({}) failed", key))?
                .l()?;

            let output = env.new_object("java/io/ByteArrayOutputStream", "()V", &[])?;
            let chunk = JObject::from(env.new_byte_array(READ_CHUNK)?);
            loop {
                let read = env
                    .call_method(&input, "read", "([B)I", &[JValue::Object(&chunk)])
                    .context("Failed to read asset stream")?
                    .i()?;
                if read < 0 {
                    break;
                }
                env.call_method(
                    &output,
                    "write",
                    "([BII)V",
                    &[JValue::Object(&chunk), JValue::Int(0), JValue::Int(read)],
                )?;
            }
            env.call_method(&input, "close", "()V", &[])?;

            let array = JByteArray::from(env.call_method(&output, "toByteArray", "()[B", &[])?.l()?);
            Ok(env.convert_byte_array(&array)?)
        })();
        clear_exception(&mut env);
        result
    }
}
