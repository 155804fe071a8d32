//! Runtime routines.
//!
//! Called like any other function: arguments are on the stack at `sp` and
//! are removed by the caller; results go into the int or double register.

use super::{errors::VmError, machine::Machine};

impl Machine<'_> {
    fn next_token(&mut self) -> Result<String, VmError> {
        let token = self
            .input
            .get(self.input_position)
            .cloned()
            .ok_or(VmError::InputExhausted)?;
        self.input_position += 1;
        Ok(token)
    }

    fn read_string(&self, address: u32) -> Result<String, VmError> {
        let mut bytes = Vec::new();
        let mut at = address;

        loop {
            let byte = *self
                .memory
                .get(at as usize)
                .ok_or(VmError::InvalidAddress { address: at as i64 })?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
            at += 1;
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Looks up the `index`-th string of a table, or 0 past its end.
    fn string_address(table: &[u32], index: i32) -> i32 {
        usize::try_from(index)
            .ok()
            .and_then(|index| table.get(index))
            .map(|address| *address as i32)
            .unwrap_or(0)
    }

    pub(super) fn call_routine(&mut self, name: &str) -> Result<(), VmError> {
        match name {
            "readi" => {
                let token = self.next_token()?;
                self.int_result = token
                    .parse()
                    .map_err(|_| VmError::InvalidInput { token })?;
            }
            "readd" => {
                let token = self.next_token()?;
                self.double_result = token
                    .parse()
                    .map_err(|_| VmError::InvalidInput { token })?;
            }
            "printi" => {
                let value = self.read_word(self.sp)?;
                self.output.push_str(&value.to_string());
            }
            "printd" => {
                let value = self.read_double(self.sp)?;
                self.output.push_str(&value.to_string());
            }
            "prints" => {
                let address = self.read_word(self.sp)? as u32;
                let string = self.read_string(address)?;
                self.output.push_str(&string);
            }
            "println" => self.output.push('\n'),
            "argv" => {
                let index = self.read_word(self.sp)?;
                self.int_result = Self::string_address(&self.args, index);
            }
            "envp" => {
                let index = self.read_word(self.sp)?;
                self.int_result = Self::string_address(&self.env, index);
            }
            _ => {
                return Err(VmError::UndefinedSymbol {
                    name: name.to_string(),
                })
            }
        }

        Ok(())
    }
}
